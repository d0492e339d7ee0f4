//! Foundation types for Cairn.
//!
//! Cairn is a filesystem-backed metadata and lineage store for versioned
//! artifacts. This crate holds the plain data types every other Cairn crate
//! speaks in.
//!
//! # Key Types
//!
//! - [`Document`] / [`Record`]: Ordered metadata records, lineage most-recent first
//! - [`Version`]: `major.minor` pair assigned to content-addressed slots
//! - [`ContentHash`]: BLAKE3 digest of a skeleton or a full document
//! - [`MetaFormat`]: Closed set of metadata file formats
//! - [`generate_slug`]: Human-readable identity tokens

pub mod document;
pub mod error;
pub mod format;
pub mod hash;
pub mod slug;
pub mod version;

pub use document::{Document, Record};
pub use error::TypeError;
pub use format::MetaFormat;
pub use hash::ContentHash;
pub use slug::generate_slug;
pub use version::Version;
