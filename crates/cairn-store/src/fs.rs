use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cairn_types::Document;
use tracing::debug;

use crate::codec::Codec;
use crate::error::{StoreError, StoreResult};
use crate::traits::{is_meta_file, single_meta, DocumentStore};

/// Document store over the local filesystem.
///
/// Every call opens, uses, and releases its own file handles. Writes go to
/// a temporary file in the destination directory which is then renamed over
/// the target, so readers never observe a half-written document.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for FileDocumentStore {
    fn read(&self, path: &Path) -> StoreResult<Document> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        let document = Codec::for_path(path).decode(path, &bytes)?;
        debug!(path = %path.display(), records = document.len(), "read document");
        Ok(document)
    }

    fn write(&self, path: &Path, document: &Document, overwrite: bool) -> StoreResult<()> {
        if !overwrite && path.exists() {
            debug!(path = %path.display(), "document exists; write skipped");
            return Ok(());
        }

        let bytes = Codec::for_path(path).encode(path, document)?;
        write_atomic(path, &bytes)?;

        debug!(path = %path.display(), records = document.len(), "wrote document");
        Ok(())
    }

    fn exists(&self, path: &Path) -> StoreResult<bool> {
        Ok(path.is_file())
    }

    fn find_meta(&self, dir: &Path) -> StoreResult<Option<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_meta_file(&path) {
                found.push(path);
            }
        }
        single_meta(dir, found)
    }
}

/// Replace `path` with `bytes` through a temporary file in the same
/// directory. Missing parent directories are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
