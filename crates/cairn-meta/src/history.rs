//! Append-only change journal.
//!
//! A journal file holds a single record:
//!
//! ```text
//! {"type": "history", "history": [{"id": 0, "logged_at": "...", "data": ...}, ...]}
//! ```
//!
//! Entries are numbered from zero in append order and never rewritten.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_store::DocumentStore;
use cairn_types::{Document, Record};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{MetaError, MetaResult};
use crate::timestamp;

const HISTORY_TYPE: &str = "history";

pub struct HistoryLogger {
    path: PathBuf,
    store: Arc<dyn DocumentStore>,
    entries: Vec<Value>,
}

impl HistoryLogger {
    /// Open the journal at `path`, starting an empty one if it does not exist.
    ///
    /// An existing file that is not shaped like a journal is rejected rather
    /// than overwritten.
    pub fn open(path: impl Into<PathBuf>, store: Arc<dyn DocumentStore>) -> MetaResult<Self> {
        let path = path.into();
        let entries = match store.read(&path) {
            Ok(document) => parse_journal(&path, &document)?,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            store,
            entries,
        })
    }

    /// Append an entry and persist the journal. Returns the entry's id.
    ///
    /// If the write fails the entry is dropped again, so the in-memory
    /// journal never runs ahead of the file.
    pub fn log(&mut self, data: Value) -> MetaResult<u64> {
        let id = self.entries.len() as u64;
        self.entries.push(json!({
            "id": id,
            "logged_at": timestamp::to_value(timestamp::now()),
            "data": data,
        }));
        if let Err(e) = self.store.write(&self.path, &self.document(), true) {
            self.entries.pop();
            return Err(e.into());
        }
        debug!(path = %self.path.display(), id, "history entry logged");
        Ok(id)
    }

    /// The data of entry `id`.
    pub fn get(&self, id: u64) -> Option<&Value> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.entries.get(i))
            .and_then(|entry| entry.get("data"))
    }

    /// Full entries, including ids and timestamps.
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> Document {
        let mut record = Record::new();
        record.insert("history".into(), Value::Array(self.entries.clone()));
        record.insert("type".into(), Value::from(HISTORY_TYPE));
        Document::from_record(record)
    }
}

impl std::fmt::Debug for HistoryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLogger")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

fn parse_journal(path: &Path, document: &Document) -> MetaResult<Vec<Value>> {
    let invalid = |reason: &str| {
        MetaError::InvalidMeta(format!("{} is not a history journal: {reason}", path.display()))
    };
    let head = match document.records() {
        [head] => head,
        _ => return Err(invalid("expected exactly one record")),
    };
    if head.get("type").and_then(Value::as_str) != Some(HISTORY_TYPE) {
        return Err(invalid("missing `type: history`"));
    }
    match head.get("history") {
        Some(Value::Array(entries)) => Ok(entries.clone()),
        _ => Err(invalid("`history` is not a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_store::{FileDocumentStore, InMemoryDocumentStore};

    #[test]
    fn log_and_get() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let mut log = HistoryLogger::open("/line/history.json", store).unwrap();
        assert!(log.is_empty());

        assert_eq!(log.log(json!({"a": 1})).unwrap(), 0);
        assert_eq!(log.log(json!({"a": 2})).unwrap(), 1);
        assert_eq!(log.get(0), Some(&json!({"a": 1})));
        assert_eq!(log.get(1), Some(&json!({"a": 2})));
        assert_eq!(log.get(2), None);
        assert_eq!(log.entries()[1]["id"], json!(1));
    }

    #[test]
    fn reopen_continues_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.yml");
        let store: Arc<dyn DocumentStore> = Arc::new(FileDocumentStore::new());

        let mut first = HistoryLogger::open(&path, store.clone()).unwrap();
        first.log(json!("one")).unwrap();

        let mut second = HistoryLogger::open(&path, store).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.log(json!("two")).unwrap(), 1);
        assert_eq!(second.get(0), Some(&json!("one")));
    }

    #[test]
    fn foreign_file_is_rejected() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let path = Path::new("/line/history.json");
        let doc = Document::from_value(json!({"type": "line", "history": []})).unwrap();
        store.write(path, &doc, true).unwrap();

        let err = HistoryLogger::open(path, store).unwrap_err();
        assert!(matches!(err, MetaError::InvalidMeta(_)));
    }

    #[test]
    fn failed_write_leaves_journal_unchanged() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let mut log = HistoryLogger::open("/line/history.txt", store).unwrap();
        assert!(log.log(json!(1)).is_err());
        assert!(log.is_empty());
    }
}
