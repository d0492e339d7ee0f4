use std::path::{Path, PathBuf};

use cairn_types::{Document, MetaFormat};

use crate::error::{StoreError, StoreResult};

/// File stem of every entity's own metadata file (`meta.json`, `meta.yml`, ...).
pub const META_STEM: &str = "meta";

/// Metadata document store.
///
/// All implementations must satisfy these invariants:
/// - `read` of an absent path fails with [`StoreError::NotFound`].
/// - `read` of an undecodable file fails with [`StoreError::Corrupt`].
/// - `write` with `overwrite = false` over an existing document is a silent no-op.
/// - The format is chosen from the path's extension, never from content.
pub trait DocumentStore: Send + Sync {
    /// Read the document stored at `path`.
    fn read(&self, path: &Path) -> StoreResult<Document>;

    /// Write `document` to `path`.
    fn write(&self, path: &Path, document: &Document, overwrite: bool) -> StoreResult<()>;

    /// Check whether a document exists at `path`.
    fn exists(&self, path: &Path) -> StoreResult<bool>;

    /// Locate the single `meta.*` document directly inside `dir`.
    ///
    /// Returns `Ok(None)` when there is none and
    /// [`StoreError::AmbiguousMeta`] when there is more than one.
    fn find_meta(&self, dir: &Path) -> StoreResult<Option<PathBuf>>;

    /// Read the `meta.*` document of a directory.
    fn read_dir(&self, dir: &Path) -> StoreResult<Document> {
        match self.find_meta(dir)? {
            Some(path) => self.read(&path),
            None => Err(StoreError::NotFound(dir.join(format!("{META_STEM}.*")))),
        }
    }

    /// Format of the `meta.*` document in `dir`, if one exists and its
    /// extension is a writable format.
    fn meta_format(&self, dir: &Path) -> StoreResult<Option<MetaFormat>> {
        Ok(self.find_meta(dir)?.and_then(|p| MetaFormat::from_path(&p)))
    }
}

/// Pick the `meta.*` entry out of a set of candidate paths.
pub(crate) fn single_meta(dir: &Path, mut found: Vec<PathBuf>) -> StoreResult<Option<PathBuf>> {
    found.sort();
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(StoreError::AmbiguousMeta {
            dir: dir.to_path_buf(),
            found,
        }),
    }
}

pub(crate) fn is_meta_file(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some(META_STEM) && path.extension().is_some()
}
