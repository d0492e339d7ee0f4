//! Annotation model and disk synchronization for Cairn.
//!
//! Every trackable thing in Cairn is an [`Entity`]: an identity plus
//! free-form annotations (tags, comments, links, a description) that render
//! into a [`Document`](cairn_types::Document). A [`PersistedEntity`] binds an
//! entity to a directory and reconciles it with the `meta.<ext>` file there
//! across process lifetimes.
//!
//! # Modules
//!
//! - [`entity`]: [`Entity`] and the [`Traceable`] capability
//! - [`annotation`]: [`Comment`] and [`Link`] records
//! - [`persisted`]: [`PersistedEntity`] and its read-merge-write `sync`
//! - [`context`]: per-collection [`Context`] (user, host, span, slugs)
//! - [`diff`]: top-level record diffs reported by `sync`
//! - [`history`]: append-only [`HistoryLogger`] journal
//! - [`timestamp`]: UTC timestamps at microsecond precision

pub mod annotation;
pub mod context;
pub mod diff;
pub mod entity;
pub mod error;
pub mod history;
pub mod persisted;
pub mod timestamp;

pub use annotation::{Comment, Link};
pub use context::Context;
pub use diff::{diff_records, RecordChange, RecordDiff};
pub use entity::{Entity, Traceable};
pub use error::{MetaError, MetaResult};
pub use history::HistoryLogger;
pub use persisted::{PersistConfig, PersistedEntity};
