//! Applicator over a live [`Store`]

use crate::collaborators::Applicator;
use crate::error::ApplyError;
use agm_asset::{AssetGuid, AssetPath, AssetRecord, GroupRef, Labels};
use agm_store::Store;

/// Writes promotions into a store
///
/// An existing record at the path keeps its guid; otherwise the promoted
/// asset's guid is used.
#[derive(Debug)]
pub struct StoreApplicator<'s> {
    store: &'s mut Store,
    applied: usize,
}

impl<'s> StoreApplicator<'s> {
    /// Applicator writing to `store`
    pub fn new(store: &'s mut Store) -> Self {
        Self { store, applied: 0 }
    }

    /// Records written so far
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied
    }
}

impl Applicator for StoreApplicator<'_> {
    fn create_or_move(
        &mut self,
        asset: AssetGuid,
        path: &AssetPath,
        group: &GroupRef,
        address: &str,
        labels: &Labels,
    ) -> Result<(), ApplyError> {
        let guid = self.store.get(path).map_or(asset, |existing| existing.guid);
        let record = AssetRecord::new(guid, address, group.clone()).with_labels(labels.iter().cloned());
        self.store.add_asset(path.clone(), record, true)?;
        self.applied += 1;
        tracing::debug!(%path, %group, "applied promotion");
        Ok(())
    }

    fn register_global_labels(&mut self, labels: &Labels) -> Result<(), ApplyError> {
        let added = self.store.add_global_labels(labels.iter().cloned())?;
        tracing::trace!(added, "registered global labels");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agm_store::StoreError;
    use agm_test_utils::{group, guid, path, record};

    fn labels(values: &[&str]) -> Labels {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn moves_existing_record_keeping_guid() {
        let mut store = Store::live();
        store
            .add_asset(path("Assets/tex.png"), record(7, "old", "A", &["hd"]), false)
            .unwrap();

        let mut applicator = StoreApplicator::new(&mut store);
        applicator
            .create_or_move(guid(99), &path("Assets/tex.png"), &group("Shared"), "tex", &labels(&["x"]))
            .unwrap();
        assert_eq!(applicator.applied(), 1);

        let moved = store.get(&path("Assets/tex.png")).unwrap();
        assert_eq!(moved.guid, guid(7));
        assert_eq!(moved.group, group("Shared"));
        assert_eq!(moved.address, "tex");
        assert_eq!(moved.labels, labels(&["x"]));
    }

    #[test]
    fn creates_missing_record_and_registers_labels() {
        let mut store = Store::live();
        let mut applicator = StoreApplicator::new(&mut store);
        applicator
            .create_or_move(guid(5), &path("Assets/tex.png"), &group("Shared"), "tex", &labels(&["a"]))
            .unwrap();
        applicator.register_global_labels(&labels(&["a", "b"])).unwrap();

        assert_eq!(store.get(&path("Assets/tex.png")).unwrap().guid, guid(5));
        assert_eq!(store.global_labels(), &labels(&["a", "b"]));
    }

    #[test]
    fn locked_store_is_reported() {
        let mut store = Store::live();
        store.lock();
        let mut applicator = StoreApplicator::new(&mut store);
        let err = applicator
            .create_or_move(guid(5), &path("Assets/tex.png"), &group("Shared"), "tex", &Labels::new())
            .unwrap_err();
        assert!(matches!(err, ApplyError::Store(StoreError::ReadOnly { .. })));
    }
}
