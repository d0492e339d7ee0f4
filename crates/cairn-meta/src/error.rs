//! Error types for entity and metadata operations.

use cairn_store::StoreError;
use thiserror::Error;

/// Errors that can occur while annotating or persisting an entity.
#[derive(Debug, Error)]
pub enum MetaError {
    /// No comment carries the given id.
    #[error("comment not found: {0}")]
    CommentNotFound(String),

    /// No link carries the given id.
    #[error("link not found: {0}")]
    LinkNotFound(String),

    /// A call was made with arguments that cannot describe anything.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A document decoded fine but does not have the expected shape.
    #[error("invalid metadata: {0}")]
    InvalidMeta(String),

    /// Unsupported format or other setup problem.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for metadata operations.
pub type MetaResult<T> = std::result::Result<T, MetaError>;
