//! Content hashes for group identity and structural comparison
//!
//! [`ContentHash`] is a 32-byte blake3 digest. The all-zero hash is reserved
//! as the hash of an absent value, so "missing" stays comparable with
//! "present" without ever being equal to it.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content hash (blake3)
///
/// Cheap to copy. Ordered so that sets of hashes can be sorted into a
/// canonical sequence before being folded into a parent hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash of an absent value.
    pub const ZERO: Self = Self([0; 32]);

    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create hash from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// First 16 hex characters, for log lines
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// True for the absent-value hash
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }
}

/// Incremental hash builder for folding child hashes into a parent
///
/// Every write is length- or tag-prefixed so that `("ab", "c")` and
/// `("a", "bc")` never collide.
#[derive(Debug, Clone, Default)]
pub struct HashBuilder {
    inner: blake3::Hasher,
}

impl HashBuilder {
    /// Start a builder with a domain tag
    #[must_use]
    pub fn tagged(tag: &str) -> Self {
        let mut builder = Self::default();
        builder.str(tag);
        builder
    }

    /// Append a string
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.inner.update(&(value.len() as u64).to_le_bytes());
        self.inner.update(value.as_bytes());
        self
    }

    /// Append a hash
    pub fn hash(&mut self, value: &ContentHash) -> &mut Self {
        self.inner.update(value.as_bytes());
        self
    }

    /// Finish into a content hash
    #[must_use]
    pub fn finish(&self) -> ContentHash {
        ContentHash(*self.inner.finalize().as_bytes())
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

// Hex string in every format; sidecar files are meant to be diffable.
impl serde::Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when working with content hashes
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Invalid hash length
    #[error("invalid hash length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
