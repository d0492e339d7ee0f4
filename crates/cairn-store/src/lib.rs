//! Metadata document storage for Cairn.
//!
//! A store reads and writes one [`Document`](cairn_types::Document) per
//! path. The concrete file format is chosen from the path's extension by a
//! closed dispatch table ([`Codec`]); callers never name a format directly.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`FileDocumentStore`] -- files on the local filesystem, atomic writes
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests
//!
//! # Design Rules
//!
//! 1. A missing file is [`StoreError::NotFound`], never an empty document.
//! 2. An unparsable file is [`StoreError::Corrupt`], never an empty document.
//! 3. Unknown extensions read as plain text and cannot be written.
//! 4. Writes replace the target atomically (temp file, then rename).
//! 5. No file handle outlives the call that opened it.

pub mod codec;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use codec::Codec;
pub use error::{StoreError, StoreResult};
pub use fs::{write_atomic, FileDocumentStore};
pub use memory::InMemoryDocumentStore;
pub use traits::{DocumentStore, META_STEM};
