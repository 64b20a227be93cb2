//! Snapshot files
//!
//! A snapshot is one JSON document holding the three stores and the asset
//! dependency graph:
//!
//! ```json
//! {
//!   "simulated": { "kind": "simulated", "records": { "Assets/a.png": { ... } } },
//!   "sidecar":   { "kind": "sidecar", "records": {} },
//!   "live":      { "kind": "live", "locked": false, "records": {} },
//!   "assets": [
//!     { "guid": "...", "path": "Assets/a.prefab", "group": "A", "depends_on": ["..."] }
//!   ]
//! }
//! ```
//!
//! Missing stores load as empty.

use agm_core::{DependencyGraph, GraphAsset, GraphError};
use agm_reconcile::{ReconcileError, StoreSet};
use agm_store::Store;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Snapshot load/save errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// File could not be read or written
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// Snapshot file
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// JSON did not parse
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A store is in the wrong slot
    #[error(transparent)]
    Stores(#[from] ReconcileError),

    /// Dependency graph is inconsistent
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Stores plus dependency graph, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulated store
    #[serde(default = "Store::simulated")]
    pub simulated: Store,
    /// Sidecar store
    #[serde(default = "Store::sidecar")]
    pub sidecar: Store,
    /// Live store
    #[serde(default = "Store::live")]
    pub live: Store,
    /// Dependency graph nodes
    #[serde(default)]
    pub assets: Vec<GraphAsset>,
}

impl Snapshot {
    /// Read a snapshot file
    ///
    /// # Errors
    /// Returns [`SnapshotError`] on I/O or JSON failure
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Self = serde_json::from_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            assets = snapshot.assets.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Write as pretty JSON
    ///
    /// # Errors
    /// Returns [`SnapshotError`] on I/O or JSON failure
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the dependency graph
    ///
    /// # Errors
    /// Returns [`SnapshotError::Graph`] for a bad edge
    pub fn graph(&self) -> Result<DependencyGraph, SnapshotError> {
        Ok(DependencyGraph::from_assets(&self.assets)?)
    }

    /// Split into a store set and the graph nodes
    ///
    /// # Errors
    /// Returns [`SnapshotError::Stores`] if a store has the wrong kind
    pub fn into_stores(self) -> Result<(StoreSet, Vec<GraphAsset>), SnapshotError> {
        let stores = StoreSet::new(self.simulated, self.sidecar, self.live)?;
        Ok((stores, self.assets))
    }

    /// Reassemble from a store set
    #[must_use]
    pub fn from_stores(stores: StoreSet, assets: Vec<GraphAsset>) -> Self {
        let (simulated, sidecar, live) = stores.into_parts();
        Self {
            simulated,
            sidecar,
            live,
            assets,
        }
    }
}
