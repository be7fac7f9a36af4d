use std::collections::BTreeMap;
use std::fs;

use serde_json::{json, Value};
use simvault_core::VaultError;
use simvault_store::{ArtifactArray, ArtifactSet, RunMetadata, RunStore};
use tempfile::tempdir;

fn params(steps: i64) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    map.insert("steps".to_string(), json!(steps));
    map
}

fn sample_arrays() -> ArtifactSet {
    let mut arrays = ArtifactSet::new();
    arrays.insert(
        "trajectory".to_string(),
        ArtifactArray::from_f64(vec![0.0, 0.5, 1.0]),
    );
    arrays
}

fn metadata_for(steps: i64, seed: u64) -> RunMetadata {
    RunMetadata::new(params(steps), seed, Some("abc123".to_string()), BTreeMap::new())
}

#[test]
fn save_then_exists_then_load() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let run_id = store
        .compute_run_id(&params(5), 3, Some("abc123"), &BTreeMap::new())
        .unwrap();
    assert!(!store.exists(&run_id));

    let arrays = sample_arrays();
    store
        .save(&run_id, &arrays, metadata_for(5, 3), "npz")
        .unwrap();
    assert!(store.exists(&run_id));

    let record = store.load(&run_id).unwrap();
    assert_eq!(record.arrays, arrays);
    assert_eq!(record.metadata.run_id.as_deref(), Some(run_id.as_str()));
    assert_eq!(record.metadata.arrays_format.as_deref(), Some("npz"));
    assert_eq!(record.metadata.arrays_path.as_deref(), Some("arrays.npz"));
}

#[test]
fn missing_run_is_not_found() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    assert!(!store.exists("deadbeef0000"));
    assert!(matches!(
        store.load("deadbeef0000").unwrap_err(),
        VaultError::NotFound(_)
    ));
    assert!(matches!(
        store.info("deadbeef0000").unwrap_err(),
        VaultError::NotFound(_)
    ));
}

#[test]
fn double_save_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let run_id = store
        .compute_run_id(&params(5), 3, None, &BTreeMap::new())
        .unwrap();
    let arrays = sample_arrays();
    let mut meta = metadata_for(5, 3);
    meta.timestamp = "2026-08-01T00:00:00+00:00".to_string();
    store.save(&run_id, &arrays, meta.clone(), "npz").unwrap();
    store.save(&run_id, &arrays, meta, "npz").unwrap();

    let runs = store.list_runs().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(store.load(&run_id).unwrap().arrays, arrays);
}

#[test]
fn different_params_make_independent_runs() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let first_id = store
        .compute_run_id(&params(5), 3, None, &BTreeMap::new())
        .unwrap();
    let second_id = store
        .compute_run_id(&params(7), 3, None, &BTreeMap::new())
        .unwrap();
    assert_ne!(first_id, second_id);

    let mut first_arrays = ArtifactSet::new();
    first_arrays.insert("values".to_string(), ArtifactArray::from_i64(vec![5]));
    let mut second_arrays = ArtifactSet::new();
    second_arrays.insert("values".to_string(), ArtifactArray::from_i64(vec![7]));

    store
        .save(&first_id, &first_arrays, metadata_for(5, 3), "npz")
        .unwrap();
    store
        .save(&second_id, &second_arrays, metadata_for(7, 3), "npz")
        .unwrap();

    assert_eq!(store.load(&first_id).unwrap().arrays, first_arrays);
    assert_eq!(store.load(&second_id).unwrap().arrays, second_arrays);
    assert_eq!(store.list_runs().unwrap().len(), 2);
}

#[test]
fn metadata_file_is_sorted_and_pretty() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let run_id = store
        .compute_run_id(&params(1), 0, None, &BTreeMap::new())
        .unwrap();
    let mut extra = BTreeMap::new();
    extra.insert("walltime_s".to_string(), json!(1.5));
    let meta = metadata_for(1, 0).with_tags(["baseline"]).with_extra(extra);
    store.save(&run_id, &sample_arrays(), meta, "npz").unwrap();

    let text = fs::read_to_string(store.run_dir(&run_id).join("metadata.json")).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["run_id"], json!(run_id));
    assert_eq!(doc["tags"], json!(["baseline"]));
    assert_eq!(doc["walltime_s"], json!(1.5));
    // Pretty printed with sorted keys.
    assert!(text.contains('\n'));
    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn export_overwrites_file_destination() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let run_id = store
        .compute_run_id(&params(2), 0, None, &BTreeMap::new())
        .unwrap();
    store
        .save(&run_id, &sample_arrays(), metadata_for(2, 0), "npz")
        .unwrap();

    let out = tempdir().unwrap();
    let dest = out.path().join("copy.npz");
    fs::write(&dest, b"stale").unwrap();
    store.export(&run_id, &dest).unwrap();
    let source_bytes = fs::read(store.run_dir(&run_id).join("arrays.npz")).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), source_bytes);
}

#[test]
fn export_replaces_directory_destination() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let run_id = store
        .compute_run_id(&params(2), 0, None, &BTreeMap::new())
        .unwrap();
    store
        .save(&run_id, &sample_arrays(), metadata_for(2, 0), "zarr")
        .unwrap();

    let out = tempdir().unwrap();
    let dest = out.path().join("exported.zarr");
    fs::create_dir_all(dest.join("leftover")).unwrap();
    store.export(&run_id, &dest).unwrap();
    assert!(!dest.join("leftover").exists());
    assert!(dest.join(".zgroup").exists());
    assert!(dest.join("trajectory").join(".zarray").exists());
    // Source untouched.
    assert!(store.run_dir(&run_id).join("arrays.zarr").exists());
}

#[test]
fn export_of_unknown_run_is_not_found() {
    let dir = tempdir().unwrap();
    let store = RunStore::open(dir.path()).unwrap();
    let out = tempdir().unwrap();
    assert!(matches!(
        store.export("deadbeef0000", out.path().join("x")).unwrap_err(),
        VaultError::NotFound(_)
    ));
}

#[test]
fn id_length_is_configurable() {
    let dir = tempdir().unwrap();
    let store = RunStore::open_with_id_len(dir.path(), 20).unwrap();
    let run_id = store
        .compute_run_id(&params(5), 3, None, &BTreeMap::new())
        .unwrap();
    assert_eq!(run_id.len(), 20);
    assert!(matches!(
        RunStore::open_with_id_len(dir.path(), 0).unwrap_err(),
        VaultError::Config(_)
    ));
}
