//! Repositories: named groups of model lines.

use std::path::{Component, Path, PathBuf};

use cairn_meta::{PersistedEntity, RecordDiff, Traceable};
use cairn_types::Document;
use tracing::info;

use crate::allocator::SequentialAllocator;
use crate::collection::{list_slot_dirs, Collection, LineCore, SlotRef};
use crate::config::LineConfig;
use crate::dispatch::CollectionKind;
use crate::error::{LineError, LineResult};
use crate::model_line::ModelLine;

/// A directory whose subdirectories are [`ModelLine`]s.
///
/// Lines are opened on demand and share the repo's config. Slot references
/// inside a repo take the form `<line>/<slot>`.
pub struct Repo {
    core: LineCore,
}

impl Repo {
    pub fn open(root: impl Into<PathBuf>) -> LineResult<Self> {
        Self::with_config(root, LineConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: LineConfig) -> LineResult<Self> {
        let core = LineCore::open(CollectionKind::Repo, root.into(), config, |root| {
            list_slot_dirs(root, |_| true)
        })?;
        let mut repo = Self { core };
        repo.core.sync()?;
        Ok(repo)
    }

    /// Create a line, or open it if it exists. Without a name the line gets
    /// the next zero-padded index.
    pub fn add_line(&mut self, name: Option<&str>) -> LineResult<ModelLine> {
        let span = self.core.span();
        let _enter = span.enter();

        let name = match name {
            Some(name) => {
                validate_line_name(name)?;
                name.to_string()
            }
            None => {
                let allocator = SequentialAllocator::new(self.core.config().slot_width);
                allocator.allocate(self.core.root(), self.core.names())?
            }
        };

        let line = ModelLine::with_config(self.core.slot_dir(&name), self.core.config().clone())?;
        if !self.core.names().contains(&name) {
            let names = self.core.names_mut();
            names.push(name.clone());
            names.sort();
            self.core.sync()?;
            info!(line = %name, "line added to repo");
        }
        Ok(line)
    }

    /// Open an existing line.
    pub fn line(&self, name: &str) -> LineResult<ModelLine> {
        if !self.core.names().iter().any(|n| n == name) {
            return Err(LineError::SlotNotFound(name.to_string()));
        }
        ModelLine::with_config(self.core.slot_dir(name), self.core.config().clone())
    }

    pub fn line_names(&self) -> &[String] {
        self.core.names()
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

impl Traceable for Repo {
    fn get_meta(&self) -> Document {
        self.core.get_meta()
    }
}

impl Collection for Repo {
    fn kind(&self) -> CollectionKind {
        self.core.kind()
    }

    fn root(&self) -> &Path {
        self.core.root()
    }

    fn slot_names(&self) -> &[String] {
        self.core.names()
    }

    /// `<line>/<slot>` loads a slot of a line; a bare line reference loads
    /// the line's own metadata.
    fn load_metadata(&self, slot: SlotRef) -> LineResult<Document> {
        match &slot {
            SlotRef::Key(key) => match key.split_once('/') {
                Some((line, inner)) => self.line(line)?.load_metadata(inner.into()),
                None => Ok(self.line(key)?.get_meta()),
            },
            SlotRef::Index(_) => {
                let name = self.core.resolve(&slot)?;
                Ok(self.line(&name)?.get_meta())
            }
        }
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("root", &self.core.root())
            .field("lines", &self.core.names())
            .finish()
    }
}

fn validate_line_name(name: &str) -> LineResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(LineError::Configuration(format!(
            "`{name}` is not a valid line name"
        ))),
    }
}
