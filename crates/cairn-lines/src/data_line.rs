//! Content-addressed lines of dataset descriptions.

use std::fs;
use std::path::{Path, PathBuf};

use cairn_crypto::ContentHasher;
use cairn_meta::{timestamp, PersistedEntity, RecordDiff, Traceable};
use cairn_types::{Document, Version};
use serde_json::Value;
use tracing::{info, warn};

use crate::collection::{list_slot_dirs, Collection, LineCore, SlotRef};
use crate::config::LineConfig;
use crate::dispatch::CollectionKind;
use crate::error::{LineError, LineResult};
use crate::resolver::{SlotHashes, VersionIndex};

/// The `type` a document must carry to be saved into a data line.
pub const DATASET_TYPE: &str = "dataset";

/// A line whose slots are named by version (`0.1`, `0.2`, `1.1`, ...).
///
/// Only metadata is stored. Saving a document that was saved before lands
/// in the same slot again.
pub struct DataLine {
    core: LineCore,
    index: VersionIndex,
}

impl DataLine {
    pub fn open(root: impl Into<PathBuf>) -> LineResult<Self> {
        Self::with_config(root, LineConfig::default())
    }

    /// Open the line and rebuild its version index from the `HASHES`
    /// sidecar of every slot.
    pub fn with_config(root: impl Into<PathBuf>, config: LineConfig) -> LineResult<Self> {
        let core = LineCore::open(CollectionKind::DataLine, root.into(), config, |root| {
            let mut names = list_slot_dirs(root, |name| name.parse::<Version>().is_ok())?;
            names.sort_by_key(|name| name.parse::<Version>().unwrap_or_default());
            Ok(names)
        })?;

        let mut index = VersionIndex::new();
        for name in core.names() {
            let hashes = SlotHashes::read(&core.slot_dir(name))?;
            let version = name
                .parse::<Version>()
                .map_err(|e| LineError::Configuration(e.to_string()))?;
            index.record(hashes.skeleton, hashes.meta, version);
        }

        let mut line = Self { core, index };
        line.core.sync()?;
        Ok(line)
    }

    /// Save a dataset description and return the version it was filed under.
    pub fn save(&mut self, item: &dyn Traceable) -> LineResult<Version> {
        let span = self.core.span();
        let _enter = span.enter();

        let mut document = item.get_meta();
        match document.get("type").and_then(Value::as_str) {
            Some(DATASET_TYPE) => {}
            other => {
                return Err(LineError::Configuration(format!(
                    "only `{DATASET_TYPE}` documents can be saved into a data line, got {}",
                    other.unwrap_or("no type")
                )))
            }
        }

        let hashes = SlotHashes {
            skeleton: ContentHasher::skeleton_hash(&document)?,
            meta: ContentHasher::meta_hash(&document)?,
        };
        let resolution = self.index.resolve(&hashes.skeleton, &hashes.meta);
        let version = resolution.version();
        let name = version.to_string();
        let slot_dir = self.core.slot_dir(&name);

        let head = document.head_mut();
        head.insert("path".into(), Value::from(slot_dir.display().to_string()));
        head.insert("saved_at".into(), timestamp::to_value(timestamp::now()));

        let is_new = !self.core.names().contains(&name);
        if let Err(e) = self.write_slot(&name, &document, &hashes) {
            if is_new {
                if let Err(cleanup) = fs::remove_dir_all(&slot_dir) {
                    warn!(slot = %name, error = %cleanup, "could not remove unfinished slot");
                }
            }
            return Err(e);
        }

        self.index.record(hashes.skeleton, hashes.meta, version);
        if !self.core.names().contains(&name) {
            let names = self.core.names_mut();
            names.push(name);
            names.sort_by_key(|n| n.parse::<Version>().unwrap_or_default());
        }
        self.core.sync()?;

        info!(%version, resolution = resolution.as_str(), "saved to data line");
        Ok(version)
    }

    fn write_slot(&self, name: &str, document: &Document, hashes: &SlotHashes) -> LineResult<()> {
        let slot_dir = self.core.slot_dir(name);
        fs::create_dir_all(&slot_dir)?;
        self.core
            .store()
            .write(&self.core.slot_meta_path(name), document, true)?;
        hashes.write(&slot_dir)
    }

    pub fn version_index(&self) -> &VersionIndex {
        &self.index
    }

    pub fn versions(&self) -> Vec<Version> {
        self.core
            .names()
            .iter()
            .filter_map(|n| n.parse().ok())
            .collect()
    }

    pub fn meta(&self) -> &PersistedEntity {
        self.core.meta()
    }

    pub fn meta_mut(&mut self) -> &mut PersistedEntity {
        self.core.meta_mut()
    }

    pub fn sync_meta(&mut self) -> LineResult<RecordDiff> {
        self.core.sync()
    }
}

impl Traceable for DataLine {
    fn get_meta(&self) -> Document {
        self.core.get_meta()
    }
}

impl Collection for DataLine {
    fn kind(&self) -> CollectionKind {
        self.core.kind()
    }

    fn root(&self) -> &Path {
        self.core.root()
    }

    fn slot_names(&self) -> &[String] {
        self.core.names()
    }

    fn load_metadata(&self, slot: SlotRef) -> LineResult<Document> {
        let name = self.core.resolve(&slot)?;
        self.core.read_slot(&name)
    }
}

impl std::fmt::Debug for DataLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLine")
            .field("root", &self.core.root())
            .field("versions", &self.core.names())
            .finish()
    }
}
