//! Content-addressed version resolution.
//!
//! Every saved document is keyed by two hashes: its skeleton hash (structure
//! only) and its meta hash (structure and values). The index maps
//! `skeleton -> meta -> version`. Resolution, in order:
//!
//! 1. known skeleton, known meta: reuse the recorded version;
//! 2. known skeleton, new meta: bump the minor of that skeleton's highest version;
//! 3. new skeleton, non-empty index: bump the major of the global highest version;
//! 4. empty index: `0.1`.
//!
//! Majors are global so version strings order every slot of a line, whatever
//! its structure.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use cairn_store::write_atomic;
use cairn_types::{ContentHash, Version};

use crate::error::{LineError, LineResult};

/// Name of the per-slot sidecar holding `skeleton_hash\nmeta_hash`.
pub const HASHES_FILE: &str = "HASHES";

/// Outcome of resolving a `(skeleton, meta)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Initial(Version),
    Reuse(Version),
    MinorBump(Version),
    MajorBump(Version),
}

impl Resolution {
    pub fn version(&self) -> Version {
        match *self {
            Resolution::Initial(v)
            | Resolution::Reuse(v)
            | Resolution::MinorBump(v)
            | Resolution::MajorBump(v) => v,
        }
    }

    pub fn is_reuse(&self) -> bool {
        matches!(self, Resolution::Reuse(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Initial(_) => "initial",
            Resolution::Reuse(_) => "reuse",
            Resolution::MinorBump(_) => "minor",
            Resolution::MajorBump(_) => "major",
        }
    }
}

/// Versions assigned so far, by skeleton hash then meta hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionIndex {
    entries: BTreeMap<ContentHash, BTreeMap<ContentHash, Version>>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded `(skeleton, meta)` pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, skeleton: &ContentHash, meta: &ContentHash) -> Option<Version> {
        self.entries.get(skeleton)?.get(meta).copied()
    }

    /// Highest version across every skeleton.
    pub fn max_version(&self) -> Option<Version> {
        self.entries
            .values()
            .flat_map(BTreeMap::values)
            .copied()
            .max()
    }

    /// Decide the version for a pair without changing the index.
    pub fn resolve(&self, skeleton: &ContentHash, meta: &ContentHash) -> Resolution {
        if let Some(by_meta) = self.entries.get(skeleton) {
            if let Some(version) = by_meta.get(meta) {
                return Resolution::Reuse(*version);
            }
            let highest = by_meta.values().copied().max().unwrap_or_default();
            return Resolution::MinorBump(highest.bump_minor());
        }
        match self.max_version() {
            Some(highest) => Resolution::MajorBump(highest.bump_major()),
            None => Resolution::Initial(Version::INITIAL),
        }
    }

    pub fn record(&mut self, skeleton: ContentHash, meta: ContentHash, version: Version) {
        self.entries
            .entry(skeleton)
            .or_default()
            .insert(meta, version);
    }
}

/// The pair of hashes stored beside a content-addressed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotHashes {
    pub skeleton: ContentHash,
    pub meta: ContentHash,
}

impl SlotHashes {
    /// Read `<slot_dir>/HASHES`. A missing or malformed file is corrupt:
    /// a slot without hashes cannot take part in resolution.
    pub fn read(slot_dir: &Path) -> LineResult<Self> {
        let path = slot_dir.join(HASHES_FILE);
        let corrupt = |reason: String| LineError::CorruptSidecar {
            path: path.clone(),
            reason,
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(corrupt("missing".into()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut lines = text.lines();
        let (Some(skeleton), Some(meta), None) = (lines.next(), lines.next(), lines.next()) else {
            return Err(corrupt("expected two lines".into()));
        };
        Ok(Self {
            skeleton: ContentHash::from_hex(skeleton).map_err(|e| corrupt(e.to_string()))?,
            meta: ContentHash::from_hex(meta).map_err(|e| corrupt(e.to_string()))?,
        })
    }

    pub fn write(&self, slot_dir: &Path) -> LineResult<()> {
        write_atomic(&slot_dir.join(HASHES_FILE), self.to_string().as_bytes())?;
        Ok(())
    }
}

impl std::fmt::Display for SlotHashes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.skeleton.to_hex(), self.meta.to_hex())
    }
}
