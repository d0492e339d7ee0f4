use cairn_types::{ContentHash, Document};

use crate::skeleton::skeleton;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a skeleton and a full document that happen to serialize
/// to the same bytes still hash differently.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document skeletons (structure only).
    pub const SKELETON: Self = Self {
        domain: "cairn-skeleton-v1",
    };
    /// Hasher for complete documents (structure and values).
    pub const META: Self = Self {
        domain: "cairn-meta-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHash::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    ///
    /// Object keys are emitted in sorted order, so two maps with the same
    /// entries hash the same regardless of insertion order.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<ContentHash, HasherError> {
        let value = serde_json::to_value(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        let data = serde_json::to_vec(&value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Skeleton hash of a document.
    pub fn skeleton_hash(document: &Document) -> Result<ContentHash, HasherError> {
        Self::SKELETON.hash_json(&skeleton(document))
    }

    /// Meta hash of a document: every record, every value.
    pub fn meta_hash(document: &Document) -> Result<ContentHash, HasherError> {
        Self::META.hash_json(document)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
