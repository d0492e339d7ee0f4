//! The capability a thing needs to be saved into a model line.

use std::path::{Path, PathBuf};

use cairn_meta::Traceable;
use serde_json::Value;

/// A failed payload save.
///
/// These never abort a save. The message ends up in the slot's
/// `errors` record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ArtifactError(String);

impl ArtifactError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<std::io::Error> for ArtifactError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<String> for ArtifactError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ArtifactError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;

/// Something with metadata and, optionally, binary payload.
pub trait Artifact: Traceable {
    /// Write the primary payload into the slot directory.
    fn save(&self, slot_dir: &Path) -> ArtifactResult<()>;

    /// Write auxiliary outputs into the slot's `artifacts/` directory.
    fn save_artifact(&self, _artifacts_dir: &Path) -> ArtifactResult<()> {
        Ok(())
    }

    /// Existing files to copy into the slot's `files/` directory.
    fn files(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Stable identity token. Defaults to the `slug` of the head record.
    fn slug(&self) -> Option<String> {
        self.get_meta()
            .get("slug")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn messages_survive_conversion() {
        let err: ArtifactError = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(ArtifactError::from("no exporter").message(), "no exporter");

        let boxed: Box<dyn std::error::Error> = Box::new(ArtifactError::new("lost"));
        assert_eq!(boxed.to_string(), "lost");
    }
}
