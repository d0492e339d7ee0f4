use std::fmt;

use crate::error::TypeError;

/// BLAKE3 digest of a metadata document or of its skeleton.
///
/// Content-addressed lines key their version index by a pair of these: the
/// skeleton hash (structure only) and the meta hash (structure and values).
/// On disk they are stored as lowercase hex, one per line, in a slot's
/// `HASHES` sidecar.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from raw bytes, without domain separation.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse one sidecar line. Surrounding whitespace is ignored.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s.trim()).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
