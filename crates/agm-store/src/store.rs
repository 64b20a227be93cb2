//! Asset metadata store
//!
//! A [`Store`] holds the `path → record` view of one provenance together with
//! the global label registry. Insertion order is preserved so that every
//! walk over a store (reconciliation passes, sidecar flushes) is stable.

use crate::sidecar::{SidecarError, SidecarReader, SidecarWriter};
use agm_asset::{AssetGuid, AssetPath, AssetRecord, Labels};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Which provenance a store represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Rule-computed proposal; never writable
    Simulated,
    /// Persisted sidecar metadata; the staging copy
    Sidecar,
    /// Authoritative deployed state
    Live,
}

impl StoreKind {
    /// Every kind, in reconciliation order
    pub const ALL: [Self; 3] = [Self::Simulated, Self::Sidecar, Self::Live];

    /// Stable lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Sidecar => "sidecar",
            Self::Live => "live",
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from store mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A different record already lives at the path
    #[error("collision at {path}: a different record is already stored")]
    Collision {
        /// Contested path
        path: AssetPath,
    },

    /// The guid is already stored under another path
    #[error("guid {guid} already stored at {existing}, refusing to add it at {path}")]
    DuplicateGuid {
        /// Offending guid
        guid: AssetGuid,
        /// Where it is already stored
        existing: AssetPath,
        /// Where the insert was attempted
        path: AssetPath,
    },

    /// Mutation attempted on a read-only store
    #[error("{kind} store is read-only")]
    ReadOnly {
        /// Store that refused
        kind: StoreKind,
    },

    /// Sidecar backing failed
    #[error(transparent)]
    Sidecar(#[from] SidecarError),
}

/// `path → record` view of one provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreSnapshot", into = "StoreSnapshot")]
pub struct Store {
    kind: StoreKind,
    locked: bool,
    records: IndexMap<AssetPath, AssetRecord>,
    by_guid: HashMap<AssetGuid, AssetPath>,
    global_labels: Labels,
    /// Paths mutated since the last sidecar flush
    pending: IndexSet<AssetPath>,
}

impl Store {
    /// Empty store of the given kind
    #[must_use]
    pub fn new(kind: StoreKind) -> Self {
        Self {
            kind,
            locked: false,
            records: IndexMap::new(),
            by_guid: HashMap::new(),
            global_labels: Labels::new(),
            pending: IndexSet::new(),
        }
    }

    /// Empty simulated store
    #[inline]
    #[must_use]
    pub fn simulated() -> Self {
        Self::new(StoreKind::Simulated)
    }

    /// Empty sidecar store
    #[inline]
    #[must_use]
    pub fn sidecar() -> Self {
        Self::new(StoreKind::Sidecar)
    }

    /// Empty live store
    #[inline]
    #[must_use]
    pub fn live() -> Self {
        Self::new(StoreKind::Live)
    }

    /// Build a store from records, bypassing the read-only check
    ///
    /// This is how the simulated view gets its contents: it is computed
    /// once and then frozen.
    ///
    /// # Errors
    /// Returns [`StoreError::Collision`] or [`StoreError::DuplicateGuid`]
    /// for conflicting input.
    pub fn from_records<I>(kind: StoreKind, records: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (AssetPath, AssetRecord)>,
    {
        let mut store = Self::new(kind);
        for (path, record) in records {
            store.insert_unchecked(path, record, false)?;
        }
        store.pending.clear();
        Ok(store)
    }

    /// Provenance of this store
    #[inline]
    #[must_use]
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    /// Whether mutations are rejected
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        match self.kind {
            StoreKind::Simulated => true,
            StoreKind::Sidecar => false,
            StoreKind::Live => self.locked,
        }
    }

    /// Lock the store against mutation (external lock on the live view)
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Release an external lock
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Insert or replace the record at `path`
    ///
    /// Re-adding an identical record is a no-op success even without
    /// `overwrite`.
    ///
    /// # Errors
    /// - [`StoreError::ReadOnly`] if the store is read-only
    /// - [`StoreError::Collision`] if a different record is at `path` and
    ///   `overwrite` is false
    /// - [`StoreError::DuplicateGuid`] if the guid lives at another path
    pub fn add_asset(
        &mut self,
        path: AssetPath,
        record: AssetRecord,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.insert_unchecked(path, record, overwrite)
    }

    fn insert_unchecked(
        &mut self,
        path: AssetPath,
        record: AssetRecord,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        if let Some(existing) = self.records.get(&path) {
            if *existing == record {
                return Ok(());
            }
            if !overwrite {
                return Err(StoreError::Collision { path });
            }
        }

        if let Some(existing) = self.by_guid.get(&record.guid) {
            if *existing != path {
                return Err(StoreError::DuplicateGuid {
                    guid: record.guid,
                    existing: existing.clone(),
                    path,
                });
            }
        }

        if let Some(previous) = self.records.get(&path) {
            if previous.guid != record.guid {
                self.by_guid.remove(&previous.guid);
            }
        }

        tracing::trace!(store = %self.kind, %path, guid = %record.guid, "store record");
        self.by_guid.insert(record.guid, path.clone());
        self.records.insert(path.clone(), record);
        self.pending.insert(path);
        Ok(())
    }

    /// Remove the record at `path`, returning it
    ///
    /// # Errors
    /// Returns [`StoreError::ReadOnly`] if the store is read-only
    pub fn remove_asset(&mut self, path: &AssetPath) -> Result<Option<AssetRecord>, StoreError> {
        self.ensure_writable()?;
        let removed = self.records.shift_remove(path);
        if let Some(record) = &removed {
            self.by_guid.remove(&record.guid);
            self.pending.insert(path.clone());
            tracing::trace!(store = %self.kind, %path, "remove record");
        }
        Ok(removed)
    }

    /// Union `labels` into the global label registry
    ///
    /// Returns how many labels were new. The registry only ever grows.
    ///
    /// # Errors
    /// Returns [`StoreError::ReadOnly`] if the store is read-only
    pub fn add_global_labels<I, S>(&mut self, labels: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_writable()?;
        let before = self.global_labels.len();
        self.global_labels.extend(labels.into_iter().map(Into::into));
        Ok(self.global_labels.len() - before)
    }

    /// Global label registry
    #[inline]
    #[must_use]
    pub fn global_labels(&self) -> &Labels {
        &self.global_labels
    }

    /// Record at `path`
    #[inline]
    #[must_use]
    pub fn get(&self, path: &AssetPath) -> Option<&AssetRecord> {
        self.records.get(path)
    }

    /// Whether a record exists at `path`
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &AssetPath) -> bool {
        self.records.contains_key(path)
    }

    /// Path and record for a guid
    #[must_use]
    pub fn find_by_guid(&self, guid: &AssetGuid) -> Option<(&AssetPath, &AssetRecord)> {
        let path = self.by_guid.get(guid)?;
        self.records.get_key_value(path)
    }

    /// Stored paths in insertion order
    pub fn paths(&self) -> impl Iterator<Item = &AssetPath> {
        self.records.keys()
    }

    /// `(path, record)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&AssetPath, &AssetRecord)> {
        self.records.iter()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Paths mutated since the last flush
    pub fn pending(&self) -> impl Iterator<Item = &AssetPath> {
        self.pending.iter()
    }

    /// Populate from a sidecar reader
    ///
    /// Paths the reader has nothing for are skipped. Loaded records are not
    /// pending: they already match the sidecar.
    ///
    /// # Errors
    /// Returns the first reader or insertion failure.
    pub fn load_sidecar<'a, R, I>(&mut self, reader: &R, paths: I) -> Result<usize, StoreError>
    where
        R: SidecarReader + ?Sized,
        I: IntoIterator<Item = &'a AssetPath>,
    {
        self.ensure_writable()?;
        let mut loaded = 0;
        for path in paths {
            if let Some(record) = reader.read(path)? {
                self.insert_unchecked(path.clone(), record, true)?;
                self.pending.shift_remove(path);
                loaded += 1;
            }
        }
        tracing::debug!(store = %self.kind, loaded, "loaded sidecar records");
        Ok(loaded)
    }

    /// Write every pending path to a sidecar writer
    ///
    /// Removed paths are deleted from the sidecar. Pending paths are only
    /// cleared once written, so a failed flush can be retried.
    ///
    /// # Errors
    /// Returns the first writer failure.
    pub fn flush_sidecar<W>(&mut self, writer: &mut W) -> Result<usize, StoreError>
    where
        W: SidecarWriter + ?Sized,
    {
        let mut flushed = 0;
        while let Some(path) = self.pending.first().cloned() {
            match self.records.get(&path) {
                Some(record) => writer.write(&path, record)?,
                None => writer.remove(&path)?,
            }
            self.pending.shift_remove(&path);
            flushed += 1;
        }
        tracing::debug!(store = %self.kind, flushed, "flushed sidecar records");
        Ok(flushed)
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        if self.is_read_only() {
            return Err(StoreError::ReadOnly { kind: self.kind });
        }
        Ok(())
    }
}

/// Serialized form of a [`Store`]
///
/// The guid index is rebuilt on load, which re-checks guid uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreSnapshot {
    kind: StoreKind,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    records: IndexMap<AssetPath, AssetRecord>,
    #[serde(default)]
    global_labels: Labels,
}

impl TryFrom<StoreSnapshot> for Store {
    type Error = StoreError;

    fn try_from(snapshot: StoreSnapshot) -> Result<Self, Self::Error> {
        let mut store = Self::from_records(snapshot.kind, snapshot.records)?;
        store.locked = snapshot.locked;
        store.global_labels = snapshot.global_labels;
        Ok(store)
    }
}

impl From<Store> for StoreSnapshot {
    fn from(store: Store) -> Self {
        Self {
            kind: store.kind,
            locked: store.locked,
            records: store.records,
            global_labels: store.global_labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agm_asset::GroupRef;
    use proptest::prelude::*;

    fn path(raw: &str) -> AssetPath {
        AssetPath::new(raw).unwrap()
    }

    fn record(id: u128, address: &str) -> AssetRecord {
        AssetRecord::new(AssetGuid::from_u128(id), address, GroupRef::named("Default"))
    }

    #[test]
    fn add_asset_rejects_collision_without_overwrite() {
        let mut store = Store::sidecar();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();

        let err = store
            .add_asset(path("a.png"), record(1, "renamed"), false)
            .unwrap_err();
        assert_eq!(err, StoreError::Collision { path: path("a.png") });
        assert_eq!(store.get(&path("a.png")).unwrap().address, "a");
    }

    #[test]
    fn add_asset_accepts_identical_reinsert() {
        let mut store = Store::sidecar();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        assert!(store.add_asset(path("a.png"), record(1, "a"), false).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_asset_overwrites_when_asked() {
        let mut store = Store::live();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        store.add_asset(path("a.png"), record(1, "b"), true).unwrap();
        assert_eq!(store.get(&path("a.png")).unwrap().address, "b");
    }

    #[test]
    fn overwrite_with_new_guid_releases_old_guid() {
        let mut store = Store::live();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        store.add_asset(path("a.png"), record(2, "a"), true).unwrap();

        assert!(store.find_by_guid(&AssetGuid::from_u128(1)).is_none());
        store.add_asset(path("b.png"), record(1, "b"), false).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn guid_is_unique_across_paths() {
        let mut store = Store::sidecar();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        let err = store.add_asset(path("b.png"), record(1, "a"), false).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateGuid { .. }));
    }

    #[test]
    fn simulated_store_is_read_only() {
        let mut store =
            Store::from_records(StoreKind::Simulated, [(path("a.png"), record(1, "a"))]).unwrap();
        assert!(store.is_read_only());
        assert_eq!(
            store.add_asset(path("b.png"), record(2, "b"), false),
            Err(StoreError::ReadOnly {
                kind: StoreKind::Simulated
            })
        );
        assert!(store.remove_asset(&path("a.png")).is_err());
        assert!(store.add_global_labels(["x"]).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn live_store_honours_external_lock() {
        let mut store = Store::live();
        assert!(!store.is_read_only());
        store.lock();
        assert!(store.is_read_only());
        assert!(store.add_asset(path("a.png"), record(1, "a"), false).is_err());
        store.unlock();
        assert!(store.add_asset(path("a.png"), record(1, "a"), false).is_ok());
    }

    #[test]
    fn global_labels_only_grow() {
        let mut store = Store::live();
        assert_eq!(store.add_global_labels(["a", "b"]).unwrap(), 2);
        assert_eq!(store.add_global_labels(["b", "c"]).unwrap(), 1);
        let labels: Vec<_> = store.global_labels().iter().cloned().collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn find_by_guid_and_remove() {
        let mut store = Store::sidecar();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        let (found, _) = store.find_by_guid(&AssetGuid::from_u128(1)).unwrap();
        assert_eq!(found, &path("a.png"));

        let removed = store.remove_asset(&path("a.png")).unwrap();
        assert!(removed.is_some());
        assert!(store.find_by_guid(&AssetGuid::from_u128(1)).is_none());
        assert!(store.remove_asset(&path("a.png")).unwrap().is_none());
    }

    #[test]
    fn serde_round_trip_rebuilds_guid_index() {
        let mut store = Store::live();
        store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
        store.add_global_labels(["x"]).unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let decoded: Store = serde_json::from_str(&json).unwrap();
        assert!(decoded.find_by_guid(&AssetGuid::from_u128(1)).is_some());
        assert_eq!(decoded.global_labels(), store.global_labels());
        assert_eq!(decoded.kind(), StoreKind::Live);
    }

    #[test]
    fn serde_rejects_duplicate_guids() {
        let guid = AssetGuid::from_u128(1);
        let group = GroupRef::named("G");
        let json = serde_json::json!({
            "kind": "sidecar",
            "records": {
                "a.png": { "guid": guid, "address": "a", "group": group },
                "b.png": { "guid": guid, "address": "b", "group": group },
            }
        });
        assert!(serde_json::from_value::<Store>(json).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { slot: u8, id: u128, overwrite: bool },
        Remove { slot: u8 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 1u128..5, any::<bool>())
                .prop_map(|(slot, id, overwrite)| Op::Add { slot, id, overwrite }),
            (0u8..4).prop_map(|slot| Op::Remove { slot }),
        ]
    }

    proptest! {
        #[test]
        fn guid_index_matches_records(ops in proptest::collection::vec(op(), 0..24)) {
            let mut store = Store::live();
            for op in ops {
                match op {
                    Op::Add { slot, id, overwrite } => {
                        let _ = store.add_asset(path(&format!("{slot}.png")), record(id, "a"), overwrite);
                    }
                    Op::Remove { slot } => {
                        store.remove_asset(&path(&format!("{slot}.png"))).unwrap();
                    }
                }
            }

            for (at, record) in store.iter() {
                let (indexed, _) = store.find_by_guid(&record.guid).unwrap();
                prop_assert_eq!(indexed, at);
            }
            for id in 1u128..5 {
                let guid = AssetGuid::from_u128(id);
                if let Some((at, record)) = store.find_by_guid(&guid) {
                    prop_assert_eq!(record.guid, guid);
                    prop_assert_eq!(store.get(at), Some(record));
                }
            }
        }
    }
}
