//! The three stores under reconciliation

use crate::error::{ReconcileError, Result};
use agm_asset::AssetPath;
use agm_store::{Store, StoreKind};
use indexmap::IndexSet;

/// Simulated, sidecar and live stores, one of each
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSet {
    simulated: Store,
    sidecar: Store,
    live: Store,
}

impl StoreSet {
    /// Group three stores
    ///
    /// # Errors
    /// Returns [`ReconcileError::WrongStoreKind`] if a store sits in the
    /// wrong slot.
    pub fn new(simulated: Store, sidecar: Store, live: Store) -> Result<Self> {
        for (expected, store) in [
            (StoreKind::Simulated, &simulated),
            (StoreKind::Sidecar, &sidecar),
            (StoreKind::Live, &live),
        ] {
            if store.kind() != expected {
                return Err(ReconcileError::WrongStoreKind {
                    expected,
                    found: store.kind(),
                });
            }
        }
        Ok(Self {
            simulated,
            sidecar,
            live,
        })
    }

    /// Three empty stores
    #[must_use]
    pub fn empty() -> Self {
        Self {
            simulated: Store::simulated(),
            sidecar: Store::sidecar(),
            live: Store::live(),
        }
    }

    /// Store of a kind
    #[must_use]
    pub fn get(&self, kind: StoreKind) -> &Store {
        match kind {
            StoreKind::Simulated => &self.simulated,
            StoreKind::Sidecar => &self.sidecar,
            StoreKind::Live => &self.live,
        }
    }

    /// Mutable store of a kind
    pub fn get_mut(&mut self, kind: StoreKind) -> &mut Store {
        match kind {
            StoreKind::Simulated => &mut self.simulated,
            StoreKind::Sidecar => &mut self.sidecar,
            StoreKind::Live => &mut self.live,
        }
    }

    /// Stores in [`StoreKind::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = &Store> {
        StoreKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    /// Union of every store's paths, in discovery order
    #[must_use]
    pub fn paths(&self) -> IndexSet<AssetPath> {
        self.iter()
            .flat_map(Store::paths)
            .cloned()
            .collect()
    }

    /// Split back into `(simulated, sidecar, live)`
    #[must_use]
    pub fn into_parts(self) -> (Store, Store, Store) {
        (self.simulated, self.sidecar, self.live)
    }
}

impl Default for StoreSet {
    fn default() -> Self {
        Self::empty()
    }
}
