//! Asset paths
//!
//! [`AssetPath`] is the key every store is indexed by. Paths are normalized
//! on construction: backslashes become `/`, empty and `.` segments are
//! dropped, so `Assets\\Art//hero.png` and `Assets/Art/hero.png` are the
//! same key.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Normalized, `/`-separated asset path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetPath(String);

impl AssetPath {
    /// Normalize and wrap a raw path
    ///
    /// # Errors
    /// Returns error if the path has no segments left after normalization
    /// or contains a `..` segment.
    pub fn new(raw: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => return Err(PathError::ParentSegment(raw.to_string())),
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// Path as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its final extension
    ///
    /// A leading dot does not start an extension: `.gitkeep` stays whole.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Final extension, without the dot
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Parent directory, if any
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// True if `self` is `other` or a directory containing it
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.0 == self.0
            || (other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }
}

impl Display for AssetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for AssetPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for AssetPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Errors from path normalization
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Nothing left after normalization
    #[error("empty asset path")]
    Empty,

    /// `..` is not allowed in asset paths
    #[error("parent segment in asset path: {0}")]
    ParentSegment(String),
}
