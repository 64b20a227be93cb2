//! Sidecar reader/writer interface
//!
//! The on-disk sidecar format belongs to the persistence collaborator. The
//! store only needs these two capabilities to load from and flush to it.

use agm_asset::{AssetPath, AssetRecord};
use std::collections::BTreeMap;

/// Error reported by a sidecar backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sidecar i/o failed for {path}: {message}")]
pub struct SidecarError {
    /// Path being read or written
    pub path: AssetPath,
    /// Backend message
    pub message: String,
}

impl SidecarError {
    /// Create error for a path
    #[must_use]
    pub fn new(path: AssetPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Reads persisted sidecar metadata
pub trait SidecarReader {
    /// Record persisted for `path`, if any
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn read(&self, path: &AssetPath) -> Result<Option<AssetRecord>, SidecarError>;
}

/// Writes sidecar metadata
pub trait SidecarWriter {
    /// Persist `record` for `path`
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn write(&mut self, path: &AssetPath, record: &AssetRecord) -> Result<(), SidecarError>;

    /// Drop whatever is persisted for `path`
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn remove(&mut self, path: &AssetPath) -> Result<(), SidecarError>;
}

/// In-memory sidecar backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySidecar {
    files: BTreeMap<AssetPath, AssetRecord>,
}

impl MemorySidecar {
    /// Empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is persisted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Persisted paths
    pub fn paths(&self) -> impl Iterator<Item = &AssetPath> {
        self.files.keys()
    }
}

impl FromIterator<(AssetPath, AssetRecord)> for MemorySidecar {
    fn from_iter<I: IntoIterator<Item = (AssetPath, AssetRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl SidecarReader for MemorySidecar {
    fn read(&self, path: &AssetPath) -> Result<Option<AssetRecord>, SidecarError> {
        Ok(self.files.get(path).cloned())
    }
}

impl SidecarWriter for MemorySidecar {
    fn write(&mut self, path: &AssetPath, record: &AssetRecord) -> Result<(), SidecarError> {
        self.files.insert(path.clone(), record.clone());
        Ok(())
    }

    fn remove(&mut self, path: &AssetPath) -> Result<(), SidecarError> {
        self.files.remove(path);
        Ok(())
    }
}
