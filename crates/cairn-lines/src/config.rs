use std::path::Path;

use cairn_meta::PersistConfig;
use cairn_types::MetaFormat;
use serde::{Deserialize, Serialize};

use crate::error::{LineError, LineResult};

/// Settings shared by every collection type.
///
/// ```toml
/// meta_format = "yml"
/// slot_width = 5
/// write_slug_sidecar = true
/// history = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Format for new metadata files. `None` means JSON, or whatever format
    /// an existing collection already uses.
    pub meta_format: Option<MetaFormat>,
    /// Digits in append-only slot names.
    pub slot_width: usize,
    /// Write a `SLUG` file next to each append-only slot's metadata.
    pub write_slug_sidecar: bool,
    /// Journal changes to the collection's own metadata in `history.<ext>`.
    pub history: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            meta_format: None,
            slot_width: 5,
            write_slug_sidecar: true,
            history: false,
        }
    }
}

impl LineConfig {
    pub fn from_toml_str(text: &str) -> LineResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| LineError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> LineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_meta_format(mut self, format: MetaFormat) -> Self {
        self.meta_format = Some(format);
        self
    }

    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    pub(crate) fn validate(&self) -> LineResult<()> {
        if self.slot_width == 0 {
            return Err(LineError::Configuration(
                "slot_width must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn persist_config(&self) -> PersistConfig {
        PersistConfig {
            format: self.meta_format,
            history: self.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = LineConfig::default();
        assert_eq!(c.meta_format, None);
        assert_eq!(c.slot_width, 5);
        assert!(c.write_slug_sidecar);
        assert!(!c.history);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = LineConfig::from_toml_str("meta_format = \".yaml\"\nhistory = true\n").unwrap();
        assert_eq!(c.meta_format, Some(MetaFormat::Yaml));
        assert!(c.history);
        assert_eq!(c.slot_width, 5);
    }

    #[test]
    fn unknown_format_is_a_configuration_error() {
        let err = LineConfig::from_toml_str("meta_format = \"xml\"").unwrap_err();
        assert!(matches!(err, LineError::Configuration(_)));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = LineConfig::from_toml_str("slot_width = 0").unwrap_err();
        assert!(matches!(err, LineError::Configuration(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cairn.toml");
        std::fs::write(&path, "slot_width = 3").unwrap();
        assert_eq!(LineConfig::load(&path).unwrap().slot_width, 3);
    }
}
