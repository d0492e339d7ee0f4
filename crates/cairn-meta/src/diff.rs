//! Record-level diff: what a `sync` changed in a head record.
//!
//! Only top-level keys are compared. A nested value that differs in any way
//! shows up as one `Modified` change carrying both full values.

use cairn_types::Record;
use serde_json::{json, Value};

/// The result of comparing two records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordDiff {
    pub changes: Vec<RecordChange>,
}

impl RecordDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RecordChange::Added { .. }))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RecordChange::Removed { .. }))
            .count()
    }

    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, RecordChange::Modified { .. }))
            .count()
    }

    /// Keys touched by any change, in change order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(RecordChange::key)
    }

    /// Drop changes to the given keys.
    pub fn without(mut self, keys: &[&str]) -> Self {
        self.changes.retain(|c| !keys.contains(&c.key()));
        self
    }

    /// Journal form: `{"added": {..}, "removed": {..}, "modified": {k: {"old", "new"}}}`.
    pub fn to_value(&self) -> Value {
        let mut added = Record::new();
        let mut removed = Record::new();
        let mut modified = Record::new();
        for change in &self.changes {
            match change {
                RecordChange::Added { key, value } => {
                    added.insert(key.clone(), value.clone());
                }
                RecordChange::Removed { key, value } => {
                    removed.insert(key.clone(), value.clone());
                }
                RecordChange::Modified { key, old, new } => {
                    modified.insert(key.clone(), json!({"old": old, "new": new}));
                }
            }
        }
        json!({"added": added, "removed": removed, "modified": modified})
    }
}

/// A single change in a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordChange {
    Added { key: String, value: Value },
    Removed { key: String, value: Value },
    Modified { key: String, old: Value, new: Value },
}

impl RecordChange {
    pub fn key(&self) -> &str {
        match self {
            RecordChange::Added { key, .. }
            | RecordChange::Removed { key, .. }
            | RecordChange::Modified { key, .. } => key,
        }
    }
}

/// Compute the diff between two records.
pub fn diff_records(old: &Record, new: &Record) -> RecordDiff {
    let mut changes = Vec::new();

    for (key, old_val) in old {
        match new.get(key) {
            Some(new_val) if new_val != old_val => changes.push(RecordChange::Modified {
                key: key.clone(),
                old: old_val.clone(),
                new: new_val.clone(),
            }),
            Some(_) => {}
            None => changes.push(RecordChange::Removed {
                key: key.clone(),
                value: old_val.clone(),
            }),
        }
    }

    for (key, new_val) in new {
        if !old.contains_key(key) {
            changes.push(RecordChange::Added {
                key: key.clone(),
                value: new_val.clone(),
            });
        }
    }

    RecordDiff { changes }
}
