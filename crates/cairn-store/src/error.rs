use std::path::PathBuf;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document exists at the path.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but cannot be decoded into a document.
    #[error("corrupt document {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The path's extension has no writable codec.
    #[error("unsupported format for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// More than one `meta.*` file in a directory; the format is ambiguous.
    #[error("ambiguous metadata in {}: found {found:?}", dir.display())]
    AmbiguousMeta { dir: PathBuf, found: Vec<PathBuf> },

    /// Encoding a document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A backend lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Whether this error only says the document is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
