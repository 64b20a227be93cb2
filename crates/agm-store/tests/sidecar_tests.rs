use agm_asset::{AssetGuid, AssetPath, AssetRecord, GroupRef};
use agm_store::{MemorySidecar, SidecarError, SidecarWriter, Store, StoreError};

fn path(raw: &str) -> AssetPath {
    AssetPath::new(raw).unwrap()
}

fn record(id: u128, address: &str) -> AssetRecord {
    AssetRecord::new(AssetGuid::from_u128(id), address, GroupRef::named("Art"))
        .with_labels(["hd"])
}

#[test]
fn load_skips_paths_without_sidecar_and_is_not_pending() {
    let backend: MemorySidecar = [(path("a.png"), record(1, "a"))].into_iter().collect();
    let mut store = Store::sidecar();

    let loaded = store
        .load_sidecar(&backend, &[path("a.png"), path("missing.png")])
        .unwrap();

    assert_eq!(loaded, 1);
    assert_eq!(store.get(&path("a.png")), Some(&record(1, "a")));
    assert_eq!(store.pending().count(), 0);
}

#[test]
fn flush_writes_changes_and_deletes_removals() {
    let mut backend: MemorySidecar = [(path("old.png"), record(9, "old"))].into_iter().collect();
    let mut store = Store::sidecar();
    store.load_sidecar(&backend, &[path("old.png")]).unwrap();

    store.add_asset(path("a.png"), record(1, "a"), false).unwrap();
    store.remove_asset(&path("old.png")).unwrap();

    let flushed = store.flush_sidecar(&mut backend).unwrap();
    assert_eq!(flushed, 2);
    assert_eq!(backend.paths().cloned().collect::<Vec<_>>(), vec![path("a.png")]);
    assert_eq!(store.pending().count(), 0);
}

struct FailingWriter;

impl SidecarWriter for FailingWriter {
    fn write(&mut self, path: &AssetPath, _record: &AssetRecord) -> Result<(), SidecarError> {
        Err(SidecarError::new(path.clone(), "disk full"))
    }

    fn remove(&mut self, path: &AssetPath) -> Result<(), SidecarError> {
        Err(SidecarError::new(path.clone(), "disk full"))
    }
}

#[test]
fn failed_flush_keeps_paths_pending() {
    let mut store = Store::sidecar();
    store.add_asset(path("a.png"), record(1, "a"), false).unwrap();

    let err = store.flush_sidecar(&mut FailingWriter).unwrap_err();
    assert!(matches!(err, StoreError::Sidecar(_)));
    assert_eq!(store.pending().count(), 1);

    let mut backend = MemorySidecar::new();
    assert_eq!(store.flush_sidecar(&mut backend).unwrap(), 1);
    assert_eq!(backend.len(), 1);
}
