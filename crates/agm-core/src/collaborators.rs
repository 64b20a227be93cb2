//! Collaborator interfaces consumed by the promotion driver
//!
//! Fact derivation and live-state mutation belong to the host. The driver
//! only sees these traits.

use crate::error::{ApplyError, FactSourceError};
use agm_asset::{AssetGuid, AssetPath, DependencyFact, GroupRef, Labels};
use agm_store::Store;
use std::collections::BTreeMap;

/// Supplies dependency facts
///
/// Called once per round. Whatever the applicator changed in earlier
/// rounds must be reflected by the next call.
pub trait DependencyFactSource {
    /// Current facts for every known asset
    ///
    /// The driver picks the duplicate roots itself and looks dependents up
    /// in the same list, so dependents' facts must be included.
    ///
    /// # Errors
    /// Returns error if facts cannot be derived
    fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError>;

    /// Told after an asset was promoted into `group`
    fn record_assignment(&mut self, _asset: AssetGuid, _group: &GroupRef) {}
}

impl<S> DependencyFactSource for &mut S
where
    S: DependencyFactSource + ?Sized,
{
    fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError> {
        (**self).duplicate_roots()
    }

    fn record_assignment(&mut self, asset: AssetGuid, group: &GroupRef) {
        (**self).record_assignment(asset, group);
    }
}

/// Fixed list of facts, re-served every round
impl DependencyFactSource for Vec<DependencyFact> {
    fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError> {
        Ok(self.clone())
    }
}

/// The only collaborator allowed to mutate live state
pub trait Applicator {
    /// Place `asset` in `group` with the given address and labels
    ///
    /// # Errors
    /// Returns error if the asset cannot be placed
    fn create_or_move(
        &mut self,
        asset: AssetGuid,
        path: &AssetPath,
        group: &GroupRef,
        address: &str,
        labels: &Labels,
    ) -> Result<(), ApplyError>;

    /// Union `labels` into the global label registry
    ///
    /// # Errors
    /// Returns error if the registry cannot be written
    fn register_global_labels(&mut self, labels: &Labels) -> Result<(), ApplyError>;
}

/// Labels already attached to an asset
pub trait LabelSource {
    /// Labels of `asset`; empty when unknown
    fn labels_of(&self, asset: &AssetGuid) -> Labels;
}

impl LabelSource for Store {
    fn labels_of(&self, asset: &AssetGuid) -> Labels {
        self.find_by_guid(asset)
            .map(|(_, record)| record.labels.clone())
            .unwrap_or_default()
    }
}

impl LabelSource for BTreeMap<AssetGuid, Labels> {
    fn labels_of(&self, asset: &AssetGuid) -> Labels {
        self.get(asset).cloned().unwrap_or_default()
    }
}
