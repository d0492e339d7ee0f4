//! Entities bound to a directory on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_store::DocumentStore;
use cairn_types::{Document, MetaFormat, Record};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::Context;
use crate::diff::{diff_records, RecordDiff};
use crate::entity::{Entity, Traceable};
use crate::error::{MetaError, MetaResult};
use crate::history::HistoryLogger;
use crate::timestamp;

/// Stem of the change journal kept next to `meta.<ext>`.
pub const HISTORY_STEM: &str = "history";

/// How a [`PersistedEntity`] chooses its file and whether it journals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Requested metadata format. An existing `meta.*` file always wins.
    pub format: Option<MetaFormat>,
    /// Append every non-trivial sync diff to `history.<ext>`.
    pub history: bool,
}

/// An [`Entity`] whose metadata lives in `<root>/meta.<ext>`.
///
/// The file is the source of truth between processes. `sync` reads it,
/// layers the in-memory state on top, and writes the result back, so keys
/// this process never touched survive. `created_at` is written once;
/// `updated_at` strictly increases with every sync.
pub struct PersistedEntity {
    entity: Entity,
    root: PathBuf,
    format: MetaFormat,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    store: Arc<dyn DocumentStore>,
    history: Option<HistoryLogger>,
}

impl PersistedEntity {
    /// Bind to `root`, loading any metadata already there.
    ///
    /// Nothing is written until the first [`sync`](Self::sync).
    pub fn open(
        root: impl Into<PathBuf>,
        store: Arc<dyn DocumentStore>,
        context: Arc<Context>,
        config: &PersistConfig,
    ) -> MetaResult<Self> {
        let root = root.into();
        let existing = store.find_meta(&root)?;

        let format = match &existing {
            Some(path) => {
                let found = MetaFormat::from_path(path).ok_or_else(|| {
                    MetaError::Configuration(format!(
                        "{} is not in a writable metadata format",
                        path.display()
                    ))
                })?;
                if let Some(requested) = config.format.filter(|r| *r != found) {
                    warn!(
                        root = %root.display(),
                        %requested,
                        %found,
                        "metadata format differs from the existing file; keeping the existing format"
                    );
                }
                found
            }
            None => config.format.unwrap_or_default(),
        };

        let mut entity = Entity::new(context);
        let mut created_at = None;
        let mut updated_at = None;
        if let Some(path) = &existing {
            let document = store.read(path)?;
            entity.from_meta(&document)?;
            created_at = take_timestamp(&mut entity, "created_at");
            updated_at = take_timestamp(&mut entity, "updated_at");
            debug!(path = %path.display(), "loaded existing metadata");
        }

        let history = if config.history {
            let path = root.join(format.file_name(HISTORY_STEM));
            Some(HistoryLogger::open(path, store.clone())?)
        } else {
            None
        };

        Ok(Self {
            entity,
            root,
            format,
            created_at,
            updated_at,
            store,
            history,
        })
    }

    /// Reconcile with the file on disk and write the merged result.
    ///
    /// Returns the top-level changes this sync made to the persisted head
    /// record. A missing file is a first sync, every key is an addition.
    pub fn sync(&mut self) -> MetaResult<RecordDiff> {
        let span = self.entity.context().span().clone();
        let _enter = span.enter();

        let path = self.meta_path();
        let persisted = match self.store.read(&path) {
            Ok(document) => Some(document),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let base: Record = persisted
            .as_ref()
            .and_then(Document::head)
            .cloned()
            .unwrap_or_default();

        let on_disk_created = base.get("created_at").and_then(timestamp::from_value);
        let on_disk_updated = base.get("updated_at").and_then(timestamp::from_value);
        let created_at = on_disk_created
            .or(self.created_at)
            .unwrap_or_else(timestamp::now);
        let updated_at = timestamp::after(on_disk_updated.max(self.updated_at));
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);

        let fresh = self.get_meta();
        let mut merged = base.clone();
        if let Some(head) = fresh.head() {
            for (key, value) in head {
                merged.insert(key.clone(), value.clone());
            }
        }
        let diff = diff_records(&base, &merged);

        let lineage = match (fresh.lineage(), &persisted) {
            ([], Some(old)) => old.lineage().to_vec(),
            (fresh_lineage, _) => fresh_lineage.to_vec(),
        };
        let document = Document::from_record(merged).chain(Document::from(lineage));
        self.store.write(&path, &document, true)?;

        debug!(
            path = %path.display(),
            added = diff.additions(),
            removed = diff.removals(),
            modified = diff.modifications(),
            "metadata synced"
        );

        if let Some(history) = self.history.as_mut() {
            let relevant = diff.clone().without(&["updated_at"]);
            if !relevant.is_empty() {
                history.log(relevant.to_value())?;
            }
        }
        Ok(diff)
    }

    /// Discard in-memory state in favor of what is on disk.
    ///
    /// A missing file leaves the entity untouched.
    pub fn reload(&mut self) -> MetaResult<()> {
        let path = self.meta_path();
        match self.store.read(&path) {
            Ok(document) => {
                self.entity.from_meta(&document)?;
                self.created_at = take_timestamp(&mut self.entity, "created_at");
                self.updated_at = take_timestamp(&mut self.entity, "updated_at");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> MetaFormat {
        self.format
    }

    /// `<root>/meta.<ext>`.
    pub fn meta_path(&self) -> PathBuf {
        self.root.join(self.format.meta_file_name())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn history(&self) -> Option<&HistoryLogger> {
        self.history.as_ref()
    }
}

impl Traceable for PersistedEntity {
    fn get_meta(&self) -> Document {
        let mut document = self.entity.get_meta();
        let head = document.head_mut();
        if let Some(ts) = self.created_at {
            head.insert("created_at".into(), timestamp::to_value(ts));
        }
        if let Some(ts) = self.updated_at {
            head.insert("updated_at".into(), timestamp::to_value(ts));
        }
        document
    }
}

impl std::fmt::Debug for PersistedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedEntity")
            .field("name", &self.entity.name())
            .field("root", &self.root)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn take_timestamp(entity: &mut Entity, key: &str) -> Option<DateTime<Utc>> {
    entity
        .remove_extra(key)
        .as_ref()
        .and_then(timestamp::from_value)
}
