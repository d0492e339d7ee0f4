use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use cairn_types::Document;

use crate::codec::Codec;
use crate::error::{StoreError, StoreResult};
use crate::traits::{is_meta_file, single_meta, DocumentStore};

/// In-memory, HashMap-based document store.
///
/// Intended for tests. Documents are keyed by path and cloned on read and
/// write. Extension rules match [`FileDocumentStore`](crate::FileDocumentStore):
/// paths without a writable codec are rejected on write.
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<PathBuf, Document>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of all stored paths.
    pub fn paths(&self) -> StoreResult<Vec<PathBuf>> {
        let map = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        let mut paths: Vec<PathBuf> = map.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read(&self, path: &Path) -> StoreResult<Document> {
        let map = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        map.get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, document: &Document, overwrite: bool) -> StoreResult<()> {
        if !Codec::for_path(path).is_writable() {
            return Err(StoreError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "no writable codec for this extension".into(),
            });
        }
        let mut map = self.documents.write().map_err(|_| StoreError::Poisoned)?;
        if overwrite || !map.contains_key(path) {
            map.insert(path.to_path_buf(), document.clone());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        let map = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.contains_key(path))
    }

    fn find_meta(&self, dir: &Path) -> StoreResult<Option<PathBuf>> {
        let map = self.documents.read().map_err(|_| StoreError::Poisoned)?;
        let found = map
            .keys()
            .filter(|p| p.parent() == Some(dir) && is_meta_file(p))
            .cloned()
            .collect();
        single_meta(dir, found)
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .finish()
    }
}
