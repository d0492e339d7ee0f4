//! Artifact collections for Cairn.
//!
//! A collection is a directory with its own `meta.<ext>` and one
//! subdirectory ("slot") per saved artifact. Two strategies name slots:
//!
//! - [`DataLine`] is content-addressed. Each saved document is hashed twice
//!   (structure only, then everything) and the [`VersionIndex`] decides
//!   whether to reuse a version, bump the minor, or open a new major line.
//! - [`ModelLine`] is append-only. The [`SequentialAllocator`] hands out
//!   zero-padded indices that only ever grow, and payload failures are
//!   recorded in the slot instead of aborting the save.
//!
//! A [`Repo`] groups named model lines, and [`open_collection`] reopens any
//! of the three from the `type` stored in its metadata.

pub mod allocator;
pub mod artifact;
pub mod collection;
pub mod config;
pub mod data_line;
pub mod dispatch;
pub mod error;
pub mod model_line;
pub mod repo;
pub mod resolver;

pub use allocator::SequentialAllocator;
pub use artifact::{Artifact, ArtifactError, ArtifactResult};
pub use collection::{Collection, SlotRef};
pub use config::LineConfig;
pub use data_line::DataLine;
pub use dispatch::{open_collection, AnyCollection, CollectionKind};
pub use error::{LineError, LineResult};
pub use model_line::{ArtifactPaths, ModelLine};
pub use repo::Repo;
pub use resolver::{Resolution, SlotHashes, VersionIndex};
