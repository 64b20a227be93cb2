use agm_cli::cli;
use agm_cli::{diff, promote, DiffOptions, PromoteOptions, Snapshot};
use agm_core::{AgmConfig, GraphAsset};
use agm_reconcile::StoreSet;
use agm_store::StoreKind;
use agm_test_utils::{group, guid, path, record, StoreFixture};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_snapshot(dir: &TempDir, fixture: StoreFixture, assets: Vec<GraphAsset>) -> PathBuf {
    let (simulated, sidecar, live) = fixture.build();
    let stores = StoreSet::new(simulated, sidecar, live).unwrap();
    let file = dir.path().join("snapshot.json");
    Snapshot::from_stores(stores, assets).save(&file).unwrap();
    file
}

fn asset(id: u128, raw_path: &str, group: Option<&str>, depends_on: &[u128]) -> GraphAsset {
    GraphAsset {
        guid: guid(id),
        path: path(raw_path),
        group: group.map(str::to_string),
        depends_on: depends_on.iter().copied().map(guid).collect(),
    }
}

/// Two prefabs in different groups sharing one material
fn shared_material_assets() -> Vec<GraphAsset> {
    vec![
        asset(1, "Assets/Hero/hero.prefab", Some("Characters"), &[3]),
        asset(2, "Assets/Villain/villain.prefab", Some("Enemies"), &[3]),
        asset(3, "Assets/Common/skin.mat", None, &[]),
    ]
}

fn prefabs_live() -> StoreFixture {
    StoreFixture::new()
        .live("Assets/Hero/hero.prefab", record(1, "hero", "Characters", &["pc"]))
        .live("Assets/Villain/villain.prefab", record(2, "villain", "Enemies", &["console"]))
}

fn output(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

fn diff_options(snapshot: &Path) -> DiffOptions {
    DiffOptions {
        snapshot: snapshot.to_path_buf(),
        path: None,
    }
}

#[test]
fn diff_reports_label_drift() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        &dir,
        StoreFixture::new()
            .sidecar("Assets/a.png", record(1, "a", "Art", &["x"]))
            .live("Assets/a.png", record(1, "a", "Art", &["y"])),
        Vec::new(),
    );

    let mut out = Vec::new();
    let drifted = diff(AgmConfig::default(), &diff_options(&snapshot), &mut out).unwrap();
    let text = output(out);

    assert!(drifted);
    assert!(text.contains("labels <container>"), "{text}");
    assert!(text.contains("sidecar!=live"), "{text}");
    assert!(text.ends_with("1 of 1 paths differ\n"), "{text}");
}

#[test]
fn diff_of_identical_stores_is_clean() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        &dir,
        StoreFixture::new().everywhere("Assets/a.png", record(1, "a", "Art", &["x"])),
        Vec::new(),
    );

    let mut out = Vec::new();
    let drifted = diff(AgmConfig::default(), &diff_options(&snapshot), &mut out).unwrap();

    assert!(!drifted);
    assert_eq!(output(out), "0 of 1 paths differ\n");
}

#[test]
fn diff_single_path_prints_its_tree() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        &dir,
        StoreFixture::new().everywhere("Assets/a.png", record(1, "a", "Art", &[])),
        Vec::new(),
    );
    let options = DiffOptions {
        snapshot,
        path: Some(path("Assets/a.png")),
    };

    let mut out = Vec::new();
    let drifted = diff(AgmConfig::default(), &options, &mut out).unwrap();
    let text = output(out);

    assert!(!drifted);
    assert!(text.contains("address <leaf>"), "{text}");
    assert!(!text.contains("paths differ"), "{text}");
}

#[test]
fn promote_writes_text_report_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir, prefabs_live(), shared_material_assets());
    let promoted = dir.path().join("promoted.json");
    let options = PromoteOptions {
        snapshot,
        rounds: None,
        json: false,
        output: Some(promoted.clone()),
    };

    let mut out = Vec::new();
    let report = promote(AgmConfig::default(), &options, &mut out).unwrap();
    let text = output(out);

    assert!(report.converged());
    assert_eq!(report.promotions.len(), 1);
    assert!(text.contains("Assets/Common/skin.mat -> Shared"), "{text}");
    assert!(text.contains("1 promoted, 0 skipped"), "{text}");

    let saved = Snapshot::load(&promoted).unwrap();
    let material = saved.live.get(&path("Assets/Common/skin.mat")).unwrap();
    assert_eq!(material.group, group("Shared"));
    assert_eq!(material.address, "skin");
    let node = saved.assets.iter().find(|a| a.guid == guid(3)).unwrap();
    assert_eq!(node.group.as_deref(), Some("Shared"));
}

#[test]
fn promote_json_report_parses() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(&dir, prefabs_live(), shared_material_assets());
    let options = PromoteOptions {
        snapshot,
        rounds: Some(3),
        json: true,
        output: None,
    };

    let mut out = Vec::new();
    promote(AgmConfig::default(), &options, &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(value["promotions"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["skipped"].as_array().map(Vec::len), Some(0));
}

#[test]
fn missing_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let options = diff_options(&dir.path().join("absent.json"));
    let err = diff(AgmConfig::default(), &options, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("loading snapshot"));
}

#[test]
fn dispatch_reports_drift_as_failure() {
    let dir = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        &dir,
        StoreFixture::new().sidecar("Assets/a.png", record(1, "a", "Art", &[])),
        Vec::new(),
    );
    let matches = cli::command()
        .try_get_matches_from(["agm", "diff", "--snapshot", snapshot.to_str().unwrap()])
        .unwrap();
    let config = cli::load_config(&matches).unwrap();

    let mut out = Vec::new();
    let succeeded = cli::dispatch(&matches, config, &mut out).unwrap();
    assert!(!succeeded);
}

#[test]
fn promoted_snapshot_keeps_other_stores() {
    let dir = TempDir::new().unwrap();
    let fixture = prefabs_live().sidecar("Assets/Common/skin.mat", record(3, "skin", "Old", &[]));
    let snapshot = write_snapshot(&dir, fixture, shared_material_assets());
    let promoted = dir.path().join("promoted.json");
    let options = PromoteOptions {
        snapshot,
        rounds: None,
        json: false,
        output: Some(promoted.clone()),
    };
    promote(AgmConfig::default(), &options, &mut Vec::new()).unwrap();

    let (stores, _) = Snapshot::load(&promoted).unwrap().into_stores().unwrap();
    let sidecar = stores.get(StoreKind::Sidecar);
    assert_eq!(
        sidecar.get(&path("Assets/Common/skin.mat")).unwrap().group,
        group("Old")
    );
}
