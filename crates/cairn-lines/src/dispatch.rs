//! Reopening a collection from what its metadata says it is.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use cairn_meta::Traceable;
use cairn_store::{DocumentStore, FileDocumentStore};
use cairn_types::Document;
use serde_json::Value;

use crate::collection::Collection;
use crate::config::LineConfig;
use crate::data_line::DataLine;
use crate::error::{LineError, LineResult};
use crate::model_line::ModelLine;
use crate::repo::Repo;

/// The closed set of collection types, as written in the `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Line,
    DataLine,
    Repo,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 3] = [
        CollectionKind::Line,
        CollectionKind::DataLine,
        CollectionKind::Repo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Line => "line",
            CollectionKind::DataLine => "data_line",
            CollectionKind::Repo => "repo",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LineError::Configuration(format!("unknown collection type `{s}`")))
    }
}

/// Any collection, opened by [`open_collection`].
#[derive(Debug)]
pub enum AnyCollection {
    Line(ModelLine),
    DataLine(DataLine),
    Repo(Repo),
}

impl AnyCollection {
    pub fn kind(&self) -> CollectionKind {
        self.as_collection().kind()
    }

    pub fn as_collection(&self) -> &dyn Collection {
        match self {
            AnyCollection::Line(line) => line,
            AnyCollection::DataLine(line) => line,
            AnyCollection::Repo(repo) => repo,
        }
    }
}

impl Traceable for AnyCollection {
    fn get_meta(&self) -> Document {
        self.as_collection().get_meta()
    }
}

/// Open the collection at `root` as whatever type its metadata records.
///
/// A root without metadata, or with a missing or unknown `type`, is a
/// configuration error.
pub fn open_collection(root: impl AsRef<Path>, config: LineConfig) -> LineResult<AnyCollection> {
    let root = root.as_ref();
    let document = match FileDocumentStore::new().read_dir(root) {
        Ok(document) => document,
        Err(e) if e.is_not_found() => {
            return Err(LineError::Configuration(format!(
                "no collection metadata in {}",
                root.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let kind: CollectionKind = document
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            LineError::Configuration(format!("{} does not record a type", root.display()))
        })?
        .parse()?;

    Ok(match kind {
        CollectionKind::Line => AnyCollection::Line(ModelLine::with_config(root, config)?),
        CollectionKind::DataLine => AnyCollection::DataLine(DataLine::with_config(root, config)?),
        CollectionKind::Repo => AnyCollection::Repo(Repo::with_config(root, config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn kinds_roundtrip_through_text() {
        for kind in CollectionKind::ALL {
            assert_eq!(kind.as_str().parse::<CollectionKind>().unwrap(), kind);
        }
        assert!(matches!(
            "workspace".parse::<CollectionKind>(),
            Err(LineError::Configuration(_))
        ));
    }

    #[test]
    fn opens_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        ModelLine::open(dir.path().join("m")).unwrap();
        DataLine::open(dir.path().join("d")).unwrap();
        Repo::open(dir.path().join("r")).unwrap();

        for (sub, kind) in [
            ("m", CollectionKind::Line),
            ("d", CollectionKind::DataLine),
            ("r", CollectionKind::Repo),
        ] {
            let opened = open_collection(dir.path().join(sub), LineConfig::default()).unwrap();
            assert_eq!(opened.kind(), kind);
            assert_eq!(opened.get_meta().get("type"), Some(&Value::from(kind.as_str())));
        }
    }

    #[test]
    fn unknown_or_missing_type_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_collection(dir.path(), LineConfig::default()),
            Err(LineError::Configuration(_))
        ));

        fs::write(dir.path().join("meta.json"), r#"{"type": "workspace"}"#).unwrap();
        assert!(matches!(
            open_collection(dir.path(), LineConfig::default()),
            Err(LineError::Configuration(_))
        ));

        fs::write(dir.path().join("meta.json"), r#"{"name": "untyped"}"#).unwrap();
        assert!(matches!(
            open_collection(dir.path(), LineConfig::default()),
            Err(LineError::Configuration(_))
        ));
    }
}
