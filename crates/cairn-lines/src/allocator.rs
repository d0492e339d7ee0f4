//! Slot naming for append-only collections.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::LineResult;

/// Hands out zero-padded decimal slot names (`00000`, `00001`, ...).
///
/// The next index is one past the highest name ever seen, so slots deleted
/// from the middle of a line are never reused. A directory is claimed with
/// `create_dir`, which fails if it already exists; a name taken behind the
/// allocator's back is skipped rather than shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequentialAllocator {
    width: usize,
}

impl SequentialAllocator {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn format(&self, index: u64) -> String {
        format!("{index:0width$}", width = self.width)
    }

    /// The index a slot name stands for, if it is one.
    pub fn parse(name: &str) -> Option<u64> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok()
    }

    /// First index to try given the names already known.
    pub fn next_index<S: AsRef<str>>(existing: &[S]) -> u64 {
        existing
            .iter()
            .filter_map(|n| Self::parse(n.as_ref()))
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Claim a new slot directory under `root` and return its name.
    pub fn allocate<S: AsRef<str>>(&self, root: &Path, existing: &[S]) -> LineResult<String> {
        let mut index = Self::next_index(existing);
        loop {
            let name = self.format(index);
            match fs::create_dir(root.join(&name)) {
                Ok(()) => return Ok(name),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(slot = %name, "slot already on disk; skipping");
                    index += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Default for SequentialAllocator {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_zero_padded() {
        let a = SequentialAllocator::default();
        assert_eq!(a.format(0), "00000");
        assert_eq!(a.format(42), "00042");
        assert_eq!(SequentialAllocator::new(3).format(7), "007");
        assert_eq!(a.format(123_456), "123456");
    }

    #[test]
    fn parse_accepts_only_digits() {
        assert_eq!(SequentialAllocator::parse("00042"), Some(42));
        assert_eq!(SequentialAllocator::parse("0.1"), None);
        assert_eq!(SequentialAllocator::parse("artifacts"), None);
        assert_eq!(SequentialAllocator::parse(""), None);
        assert_eq!(SequentialAllocator::parse("+1"), None);
    }

    #[test]
    fn next_index_is_past_the_maximum() {
        let none: [&str; 0] = [];
        assert_eq!(SequentialAllocator::next_index(&none), 0);
        assert_eq!(SequentialAllocator::next_index(&["00000", "00004"]), 5);
        assert_eq!(SequentialAllocator::next_index(&["notes", "00002"]), 3);
    }

    #[test]
    fn allocate_claims_directories() {
        let dir = tempfile::tempdir().unwrap();
        let a = SequentialAllocator::default();
        let first = a.allocate::<&str>(dir.path(), &[]).unwrap();
        assert_eq!(first, "00000");
        assert!(dir.path().join("00000").is_dir());
        let second = a.allocate(dir.path(), &[first]).unwrap();
        assert_eq!(second, "00001");
    }

    #[test]
    fn stale_listing_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("00000")).unwrap();
        fs::create_dir(dir.path().join("00001")).unwrap();
        let name = SequentialAllocator::default()
            .allocate::<&str>(dir.path(), &[])
            .unwrap();
        assert_eq!(name, "00002");
    }

    #[test]
    fn gaps_are_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let name = SequentialAllocator::default()
            .allocate(dir.path(), &["00000", "00004"])
            .unwrap();
        assert_eq!(name, "00005");
    }
}
