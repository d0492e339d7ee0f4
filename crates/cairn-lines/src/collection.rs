//! What every collection offers, and the state they all share.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cairn_meta::{Context, PersistedEntity, RecordDiff, Traceable};
use cairn_store::{DocumentStore, FileDocumentStore};
use cairn_types::Document;
use serde_json::Value;
use tracing::{info_span, Span};

use crate::config::LineConfig;
use crate::dispatch::CollectionKind;
use crate::error::{LineError, LineResult};

/// Name of the sidecar holding a slot's identity token.
pub const SLUG_FILE: &str = "SLUG";

/// A way to point at one slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotRef {
    /// Position in the collection's slot order.
    Index(usize),
    /// A slot name, or the identity token of the artifact saved there.
    Key(String),
}

impl From<usize> for SlotRef {
    fn from(index: usize) -> Self {
        SlotRef::Index(index)
    }
}

impl From<&str> for SlotRef {
    fn from(key: &str) -> Self {
        SlotRef::Key(key.to_string())
    }
}

impl From<String> for SlotRef {
    fn from(key: String) -> Self {
        SlotRef::Key(key)
    }
}

impl std::fmt::Display for SlotRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotRef::Index(i) => write!(f, "#{i}"),
            SlotRef::Key(k) => f.write_str(k),
        }
    }
}

/// The contract shared by lines and repos.
pub trait Collection: Traceable {
    fn kind(&self) -> CollectionKind;

    fn root(&self) -> &Path;

    /// Slot names in slot order.
    fn slot_names(&self) -> &[String];

    fn len(&self) -> usize {
        self.slot_names().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The document stored in one slot.
    fn load_metadata(&self, slot: SlotRef) -> LineResult<Document>;
}

/// Collection metadata plus the ordered slot list.
pub(crate) struct LineCore {
    kind: CollectionKind,
    meta: PersistedEntity,
    names: Vec<String>,
    config: LineConfig,
    store: Arc<dyn DocumentStore>,
}

impl LineCore {
    /// Open the collection at `root`, creating the directory if needed.
    ///
    /// `names` is the slot list discovered by the caller. Metadata of a
    /// different collection type at `root` is refused.
    pub(crate) fn open(
        kind: CollectionKind,
        root: PathBuf,
        config: LineConfig,
        names: impl FnOnce(&Path) -> LineResult<Vec<String>>,
    ) -> LineResult<Self> {
        config.validate()?;
        if root.exists() && !root.is_dir() {
            return Err(LineError::Configuration(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        fs::create_dir_all(&root)?;

        let store: Arc<dyn DocumentStore> = Arc::new(FileDocumentStore::new());
        let span = info_span!("collection", kind = kind.as_str(), root = %root.display());
        let context = Arc::new(Context::local().with_span(span));
        let meta = PersistedEntity::open(&root, store.clone(), context, &config.persist_config())?;

        if let Some(found) = meta.entity().extra().get("type").and_then(Value::as_str) {
            if found != kind.as_str() {
                return Err(LineError::Configuration(format!(
                    "{} holds a `{found}`, not a `{kind}`",
                    root.display()
                )));
            }
        }

        let names = names(&root)?;
        Ok(Self {
            kind,
            meta,
            names,
            config,
            store,
        })
    }

    /// Refresh `len`, `root` and `type`, then sync the collection's meta.
    pub(crate) fn sync(&mut self) -> LineResult<RecordDiff> {
        let root = self.root().display().to_string();
        let len = self.names.len();
        let entity = self.meta.entity_mut();
        entity.set("len", len);
        entity.set("root", root);
        entity.set("type", self.kind.as_str());
        Ok(self.meta.sync()?)
    }

    pub(crate) fn get_meta(&self) -> Document {
        let mut document = self.meta.get_meta();
        let head = document.head_mut();
        head.insert("len".into(), Value::from(self.names.len()));
        head.insert("root".into(), Value::from(self.root().display().to_string()));
        head.insert("type".into(), Value::from(self.kind.as_str()));
        document
    }

    pub(crate) fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub(crate) fn root(&self) -> &Path {
        self.meta.root()
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn names_mut(&mut self) -> &mut Vec<String> {
        &mut self.names
    }

    pub(crate) fn config(&self) -> &LineConfig {
        &self.config
    }

    pub(crate) fn meta(&self) -> &PersistedEntity {
        &self.meta
    }

    pub(crate) fn meta_mut(&mut self) -> &mut PersistedEntity {
        &mut self.meta
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub(crate) fn span(&self) -> Span {
        self.meta.entity().context().span().clone()
    }

    pub(crate) fn context(&self) -> &Arc<Context> {
        self.meta.entity().context()
    }

    pub(crate) fn slot_dir(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Path of a slot's own metadata file, in the collection's format.
    pub(crate) fn slot_meta_path(&self, name: &str) -> PathBuf {
        self.slot_dir(name).join(self.meta.format().meta_file_name())
    }

    pub(crate) fn read_slot(&self, name: &str) -> LineResult<Document> {
        Ok(self.store.read_dir(&self.slot_dir(name))?)
    }

    /// Turn a reference into a slot name.
    ///
    /// Keys are matched against slot names and against identity tokens. A
    /// key that points at more than one slot is refused as ambiguous.
    pub(crate) fn resolve(&self, slot: &SlotRef) -> LineResult<String> {
        match slot {
            SlotRef::Index(i) => self
                .names
                .get(*i)
                .cloned()
                .ok_or_else(|| LineError::SlotNotFound(slot.to_string())),
            SlotRef::Key(key) => {
                let mut matches = self.slots_with_slug(key)?;
                if self.names.contains(key) && !matches.contains(key) {
                    matches.insert(0, key.clone());
                }
                match matches.len() {
                    0 => Err(LineError::SlotNotFound(key.clone())),
                    1 => Ok(matches.remove(0)),
                    _ => Err(LineError::Configuration(format!(
                        "`{key}` refers to more than one slot: {}",
                        matches.join(", ")
                    ))),
                }
            }
        }
    }

    fn slots_with_slug(&self, slug: &str) -> LineResult<Vec<String>> {
        let mut found = Vec::new();
        for name in &self.names {
            if self.slot_slug(name)?.as_deref() == Some(slug) {
                found.push(name.clone());
            }
        }
        Ok(found)
    }

    /// The identity token of a slot: its `SLUG` sidecar, else the `slug`
    /// field of its metadata.
    fn slot_slug(&self, name: &str) -> LineResult<Option<String>> {
        let dir = self.slot_dir(name);
        match fs::read_to_string(dir.join(SLUG_FILE)) {
            Ok(text) => return Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match self.store.read_dir(&dir) {
            Ok(doc) => Ok(doc.get("slug").and_then(Value::as_str).map(str::to_string)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Names of the subdirectories of `root` accepted by `keep`.
pub(crate) fn list_slot_dirs(root: &Path, keep: impl Fn(&str) -> bool) -> LineResult<Vec<String>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if keep(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
