//! Append-only lines of model snapshots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cairn_meta::{timestamp, PersistedEntity, RecordDiff, Traceable};
use cairn_store::write_atomic;
use cairn_types::{Document, Record};
use serde_json::Value;
use tracing::{info, warn};

use crate::allocator::SequentialAllocator;
use crate::artifact::{Artifact, ArtifactError};
use crate::collection::{list_slot_dirs, Collection, LineCore, SlotRef, SLUG_FILE};
use crate::config::LineConfig;
use crate::dispatch::CollectionKind;
use crate::error::LineResult;

/// Subdirectory of a slot for `Artifact::save_artifact` output.
pub const ARTIFACTS_DIR: &str = "artifacts";
/// Subdirectory of a slot for copies of `Artifact::files`.
pub const FILES_DIR: &str = "files";

/// Files written into a slot besides its metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub artifacts: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// A line of saves numbered `00000`, `00001`, ...
///
/// A save always produces a slot with metadata. Payload steps that fail are
/// written down under `errors` in that metadata (`errors.save`,
/// `errors.save_artifact`, `errors.files`) and the save carries on.
pub struct ModelLine {
    core: LineCore,
    allocator: SequentialAllocator,
}

impl ModelLine {
    pub fn open(root: impl Into<PathBuf>) -> LineResult<Self> {
        Self::with_config(root, LineConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: LineConfig) -> LineResult<Self> {
        let allocator = SequentialAllocator::new(config.slot_width);
        let core = LineCore::open(CollectionKind::Line, root.into(), config, |root| {
            list_slot_dirs(root, |name| SequentialAllocator::parse(name).is_some())
        })?;
        let mut line = Self { core, allocator };
        line.core.sync()?;
        Ok(line)
    }

    /// Save `item` into a fresh slot and return the slot name.
    ///
    /// With `only_meta`, payload steps are skipped entirely. Only allocation
    /// and metadata writes can fail the call.
    pub fn save(&mut self, item: &dyn Artifact, only_meta: bool) -> LineResult<String> {
        let span = self.core.span();
        let _enter = span.enter();

        let name = self.allocator.allocate(self.core.root(), self.core.names())?;
        let slot_dir = self.core.slot_dir(&name);

        let mut document = item.get_meta();
        let errors = if only_meta {
            Record::new()
        } else {
            save_payload(item, &slot_dir)
        };
        let slug = item.slug().unwrap_or_else(|| self.core.context().slug());

        let head = document.head_mut();
        if !errors.is_empty() {
            head.insert("errors".into(), Value::Object(errors));
        }
        head.insert("slug".into(), Value::from(slug.clone()));
        head.insert("path".into(), Value::from(slot_dir.display().to_string()));
        head.insert("saved_at".into(), timestamp::to_value(timestamp::now()));

        if let Err(e) = self.write_slot(&name, &document, &slug) {
            if let Err(cleanup) = fs::remove_dir_all(&slot_dir) {
                warn!(slot = %name, error = %cleanup, "could not remove unfinished slot");
            }
            return Err(e);
        }

        self.core.names_mut().push(name.clone());
        self.core.sync()?;
        info!(slot = %name, only_meta, "saved to line");
        Ok(name)
    }

    fn write_slot(&self, name: &str, document: &Document, slug: &str) -> LineResult<()> {
        self.core
            .store()
            .write(&self.core.slot_meta_path(name), document, true)?;
        if self.core.config().write_slug_sidecar {
            write_atomic(&self.core.slot_dir(name).join(SLUG_FILE), slug.as_bytes())?;
        }
        Ok(())
    }

    /// Files the payload steps left in a slot.
    pub fn artifact_paths(&self, slot: impl Into<SlotRef>) -> LineResult<ArtifactPaths> {
        let name = self.core.resolve(&slot.into())?;
        let dir = self.core.slot_dir(&name);
        Ok(ArtifactPaths {
            artifacts: list_files(&dir.join(ARTIFACTS_DIR))?,
            files: list_files(&dir.join(FILES_DIR))?,
        })
    }

    pub fn meta(&self) -> &PersistedEntity {
        self.core.meta()
    }

    /// Annotate the line itself. Call [`sync_meta`](Self::sync_meta) to persist.
    pub fn meta_mut(&mut self) -> &mut PersistedEntity {
        self.core.meta_mut()
    }

    pub fn sync_meta(&mut self) -> LineResult<RecordDiff> {
        self.core.sync()
    }
}

impl Traceable for ModelLine {
    fn get_meta(&self) -> Document {
        self.core.get_meta()
    }
}

impl Collection for ModelLine {
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

impl std::fmt::Debug for ModelLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLine")
            .field("root", &self.core.root())
            .field("len", &self.core.names().len())
            .finish()
    }
}

/// Run the payload steps, collecting failures by step name.
fn save_payload(item: &dyn Artifact, slot_dir: &Path) -> Record {
    let mut errors = Record::new();
    let mut record = |step: &str, error: ArtifactError| {
        warn!(step, slot = %slot_dir.display(), error = %error, "payload step failed");
        errors.insert(step.to_string(), Value::from(error.message()));
    };

    if let Err(e) = item.save(slot_dir) {
        record("save", e);
    }

    let artifacts_dir = slot_dir.join(ARTIFACTS_DIR);
    let saved = fs::create_dir_all(&artifacts_dir)
        .map_err(ArtifactError::from)
        .and_then(|()| item.save_artifact(&artifacts_dir));
    if let Err(e) = saved {
        record("save_artifact", e);
    }

    let files = item.files();
    if !files.is_empty() {
        if let Err(e) = copy_files(&files, &slot_dir.join(FILES_DIR)) {
            record("files", e);
        }
    }
    errors
}

fn copy_files(files: &[PathBuf], dest: &Path) -> Result<(), ArtifactError> {
    fs::create_dir_all(dest)?;
    for src in files {
        let file_name = src
            .file_name()
            .ok_or_else(|| ArtifactError::new(format!("{} has no file name", src.display())))?;
        fs::copy(src, dest.join(file_name))
            .map_err(|e| ArtifactError::new(format!("{}: {e}", src.display())))?;
    }
    Ok(())
}

fn list_files(dir: &Path) -> LineResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineError;
    use cairn_store::{DocumentStore, FileDocumentStore};
    use serde_json::json;

    struct Model {
        meta: Value,
        fail_save: bool,
        fail_artifact: bool,
        files: Vec<PathBuf>,
    }

    impl Model {
        fn new(params: Value) -> Self {
            Self {
                meta: json!({"name": "model", "type": "model", "params": params}),
                fail_save: false,
                fail_artifact: false,
                files: Vec::new(),
            }
        }
    }

    impl Traceable for Model {
        fn get_meta(&self) -> Document {
            Document::from_value(self.meta.clone()).unwrap()
        }
    }

    impl Artifact for Model {
        fn save(&self, slot_dir: &Path) -> Result<(), ArtifactError> {
            if self.fail_save {
                return Err("disk full".into());
            }
            fs::write(slot_dir.join("model.bin"), b"weights")?;
            Ok(())
        }

        fn save_artifact(&self, dir: &Path) -> Result<(), ArtifactError> {
            if self.fail_artifact {
                return Err("no exporter".into());
            }
            fs::write(dir.join("model"), b"exported")?;
            Ok(())
        }

        fn files(&self) -> Vec<PathBuf> {
            self.files.clone()
        }
    }

    fn read_slot(root: &Path, name: &str) -> Document {
        FileDocumentStore.read(&root.join(name).join("meta.json")).unwrap()
    }

    #[test]
    fn opening_writes_line_meta() {
        let dir = tempfile::tempdir().unwrap();
        let line = ModelLine::open(dir.path()).unwrap();
        let on_disk = FileDocumentStore.read(&dir.path().join("meta.json")).unwrap();
        assert_eq!(on_disk.get("type"), Some(&json!("line")));
        assert_eq!(on_disk.get("len"), Some(&json!(0)));
        assert!(line.is_empty());
    }

    #[test]
    fn names_are_sequential_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        let model = Model::new(json!({"lr": 0.1}));
        for _ in 0..3 {
            line.save(&model, false).unwrap();
        }
        assert_eq!(line.slot_names(), ["00000", "00001", "00002"]);

        let reopened = ModelLine::open(dir.path()).unwrap();
        assert_eq!(reopened.slot_names(), line.slot_names());
        assert_eq!(reopened.get_meta().get("len"), Some(&json!(3)));
    }

    #[test]
    fn deleted_slots_are_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        let model = Model::new(json!({}));
        for _ in 0..5 {
            line.save(&model, true).unwrap();
        }
        for name in ["00001", "00002", "00003"] {
            fs::remove_dir_all(dir.path().join(name)).unwrap();
        }
        assert_eq!(line.save(&model, true).unwrap(), "00005");
        assert!(dir.path().join("00005").is_dir());

        let mut reopened = ModelLine::open(dir.path()).unwrap();
        assert_eq!(reopened.slot_names(), ["00000", "00004", "00005"]);
        assert_eq!(reopened.save(&model, true).unwrap(), "00006");
    }

    #[test]
    fn failed_payload_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        let mut model = Model::new(json!({}));
        model.fail_save = true;

        let name = line.save(&model, false).unwrap();
        assert_eq!(line.len(), 1);
        let doc = read_slot(dir.path(), &name);
        assert_eq!(doc.get("errors").unwrap()["save"], json!("disk full"));
        assert!(doc.get("errors").unwrap().get("save_artifact").is_none());
    }

    #[test]
    fn failed_auxiliary_step_is_recorded_separately() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        let mut model = Model::new(json!({}));
        model.fail_artifact = true;

        let name = line.save(&model, false).unwrap();
        let doc = read_slot(dir.path(), &name);
        let errors = doc.get("errors").unwrap();
        assert_eq!(errors["save_artifact"], json!("no exporter"));
        assert!(errors.get("save").is_none());
        assert!(dir.path().join(&name).join("model.bin").is_file());
    }

    #[test]
    fn clean_save_has_no_errors_and_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        let name = line.save(&Model::new(json!({"a": 0})), false).unwrap();
        let doc = read_slot(dir.path(), &name);
        assert!(doc.get("errors").is_none());
        assert_eq!(doc.get("params"), Some(&json!({"a": 0})));
        assert!(doc.get("saved_at").and_then(Value::as_str).is_some());
        assert_eq!(
            doc.get("path"),
            Some(&json!(dir.path().join(&name).display().to_string()))
        );
    }

    #[test]
    fn load_metadata_by_index_name_and_slug() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        line.save(&Model::new(json!({"n": 0})), true).unwrap();
        line.save(&Model::new(json!({"n": 1})), true).unwrap();

        let slug = fs::read_to_string(dir.path().join("00001").join(SLUG_FILE)).unwrap();
        let by_slug = line.load_metadata(slug.as_str().into()).unwrap();
        assert_eq!(by_slug.get("slug"), Some(&json!(slug)));
        assert_eq!(by_slug.get("params"), Some(&json!({"n": 1})));

        assert_eq!(line.load_metadata(SlotRef::Index(1)).unwrap(), by_slug);
        assert_eq!(line.load_metadata("00001".into()).unwrap(), by_slug);
        assert!(matches!(
            line.load_metadata(SlotRef::Index(7)),
            Err(LineError::SlotNotFound(_))
        ));
        assert!(matches!(
            line.load_metadata("nobody".into()),
            Err(LineError::SlotNotFound(_))
        ));
    }

    #[test]
    fn shared_slug_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        for epoch in [1, 2] {
            let mut model = Model::new(json!({"epoch": epoch}));
            model.meta["slug"] = json!("swift-amber-heron");
            line.save(&model, true).unwrap();
        }

        assert!(matches!(
            line.load_metadata("swift-amber-heron".into()),
            Err(LineError::Configuration(_))
        ));
        let second = line.load_metadata("00001".into()).unwrap();
        assert_eq!(second.get("params"), Some(&json!({"epoch": 2})));
    }

    #[test]
    fn artifact_paths_lists_payload_files() {
        let dir = tempfile::tempdir().unwrap();
        let extra = dir.path().join("file.txt");
        fs::write(&extra, "hello").unwrap();
        let root = dir.path().join("line");

        let mut line = ModelLine::open(&root).unwrap();
        let mut model = Model::new(json!({}));
        model.files.push(extra);
        line.save(&model, false).unwrap();

        let paths = line.artifact_paths(0usize).unwrap();
        assert_eq!(paths.artifacts, vec![root.join("00000").join("artifacts").join("model")]);
        assert_eq!(paths.files, vec![root.join("00000").join("files").join("file.txt")]);
    }

    #[test]
    fn missing_file_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path().join("line")).unwrap();
        let mut model = Model::new(json!({}));
        model.files.push(dir.path().join("absent.txt"));
        let name = line.save(&model, false).unwrap();
        let doc = read_slot(&dir.path().join("line"), &name);
        assert!(doc.get("errors").unwrap().get("files").is_some());
    }

    #[test]
    fn yaml_line_keeps_its_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = LineConfig::default().with_meta_format(cairn_types::MetaFormat::Yml);
        let mut line = ModelLine::with_config(dir.path(), config).unwrap();
        line.save(&Model::new(json!({})), true).unwrap();
        assert!(dir.path().join("meta.yml").is_file());
        assert!(dir.path().join("00000").join("meta.yml").is_file());

        ModelLine::open(dir.path()).unwrap();
        assert!(!dir.path().join("meta.json").exists());
    }

    #[test]
    fn line_annotations_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut line = ModelLine::open(dir.path()).unwrap();
        line.meta_mut().entity_mut().tag(["baseline"]);
        line.meta_mut().entity_mut().comment("first try");
        line.sync_meta().unwrap();

        let reopened = ModelLine::open(dir.path()).unwrap();
        assert!(reopened.meta().entity().tags().contains("baseline"));
        assert_eq!(reopened.meta().entity().comments()[0].id, "1");
    }
}
