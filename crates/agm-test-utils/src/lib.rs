//! Testing utilities for AGM workspace
//!
//! Shared fixtures for asset records, stores and dependency facts.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use agm_asset::{AssetGuid, AssetPath, AssetRecord, DependencyFact, GroupRef};
use agm_store::{Store, StoreKind};

pub fn path(raw: &str) -> AssetPath {
    AssetPath::new(raw).unwrap()
}

pub fn guid(id: u128) -> AssetGuid {
    AssetGuid::from_u128(id)
}

pub fn group(name: &str) -> GroupRef {
    GroupRef::named(name)
}

pub fn record(id: u128, address: &str, group_name: &str, labels: &[&str]) -> AssetRecord {
    AssetRecord::new(guid(id), address, group(group_name)).with_labels(labels.iter().copied())
}

/// Fact for an implicit asset pulled in by several dependents
pub fn duplicate_root(id: u128, raw_path: &str, dependents: &[u128], groups: &[&str]) -> DependencyFact {
    DependencyFact {
        asset: guid(id),
        path: path(raw_path),
        is_duplicate: true,
        is_implicit_root: true,
        dependents: dependents.iter().copied().map(guid).collect(),
        bundle_groups: groups.iter().copied().map(group).collect(),
    }
}

/// Builds the three stores for a reconciliation test
#[derive(Debug, Clone, Default)]
pub struct StoreFixture {
    simulated: Vec<(AssetPath, AssetRecord)>,
    sidecar: Vec<(AssetPath, AssetRecord)>,
    live: Vec<(AssetPath, AssetRecord)>,
    lock_live: bool,
}

impl StoreFixture {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn simulated(mut self, raw_path: &str, record: AssetRecord) -> Self {
        self.simulated.push((path(raw_path), record));
        self
    }

    #[must_use]
    pub fn sidecar(mut self, raw_path: &str, record: AssetRecord) -> Self {
        self.sidecar.push((path(raw_path), record));
        self
    }

    #[must_use]
    pub fn live(mut self, raw_path: &str, record: AssetRecord) -> Self {
        self.live.push((path(raw_path), record));
        self
    }

    /// Same record in all three stores
    #[must_use]
    pub fn everywhere(self, raw_path: &str, record: AssetRecord) -> Self {
        self.simulated(raw_path, record.clone())
            .sidecar(raw_path, record.clone())
            .live(raw_path, record)
    }

    #[must_use]
    pub fn locked_live(mut self) -> Self {
        self.lock_live = true;
        self
    }

    /// `(simulated, sidecar, live)`
    pub fn build(self) -> (Store, Store, Store) {
        let simulated = Store::from_records(StoreKind::Simulated, self.simulated).unwrap();
        let sidecar = Store::from_records(StoreKind::Sidecar, self.sidecar).unwrap();
        let mut live = Store::from_records(StoreKind::Live, self.live).unwrap();
        if self.lock_live {
            live.lock();
        }
        (simulated, sidecar, live)
    }
}
