//! Error types for collection operations.

use std::path::PathBuf;

use cairn_crypto::HasherError;
use cairn_meta::MetaError;
use cairn_store::StoreError;
use thiserror::Error;

/// Errors that can occur while opening, saving to, or reading a collection.
#[derive(Debug, Error)]
pub enum LineError {
    /// No slot matches the reference.
    #[error("slot not found: {0}")]
    SlotNotFound(String),

    /// A `HASHES` sidecar is missing or unreadable.
    #[error("corrupt hash sidecar at {path}: {reason}")]
    CorruptSidecar { path: PathBuf, reason: String },

    /// Unknown collection type, ambiguous reference, bad config, wrong
    /// artifact type.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("metadata error: {0}")]
    Meta(#[from] MetaError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("hash error: {0}")]
    Hash(#[from] HasherError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for collection operations.
pub type LineResult<T> = std::result::Result<T, LineError>;
