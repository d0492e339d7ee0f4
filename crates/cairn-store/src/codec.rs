//! Extension-to-codec dispatch.

use std::path::Path;

use cairn_types::{Document, Record};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Encoder/decoder for one file format.
///
/// Dispatch is a closed table on the path's extension: `.json` is JSON,
/// `.yml` and `.yaml` are YAML, and everything else falls back to read-only
/// plain text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Codec {
    Json,
    Yaml,
    /// Reads a file as `{<path>: <text>}`. Cannot write.
    Text,
}

impl Codec {
    /// Choose the codec for a path.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Codec::Json,
            Some("yml") | Some("yaml") => Codec::Yaml,
            _ => Codec::Text,
        }
    }

    /// Whether documents can be written with this codec.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Codec::Text)
    }

    /// Decode file bytes into a document.
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> StoreResult<Document> {
        let corrupt = |reason: String| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let value: Value = match self {
            Codec::Json => serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?,
            Codec::Yaml => serde_yaml::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?,
            Codec::Text => {
                let text = std::str::from_utf8(bytes).map_err(|e| corrupt(e.to_string()))?;
                let mut record = Record::new();
                record.insert(path.display().to_string(), Value::from(text));
                return Ok(Document::from_record(record));
            }
        };
        Document::from_value(value).map_err(|e| corrupt(e.to_string()))
    }

    /// Encode a document for writing.
    pub fn encode(&self, path: &Path, document: &Document) -> StoreResult<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec_pretty(document)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Codec::Yaml => serde_yaml::to_string(document)
                .map(String::into_bytes)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Codec::Text => Err(StoreError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "text files are read-only".into(),
            }),
        }
    }
}
