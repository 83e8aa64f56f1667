//! Integration-level unit tests for the TrackingStore.
//!
//! Each test gets its own temp directory holding both the snapshot directory
//! and the pointer file.

use std::fs;
use std::path::{Path, PathBuf};

use raindrop_sync::managers::tracking_store::{TrackingStore, TrackingStoreTrait};
use raindrop_sync::types::config::StoreConfig;
use raindrop_sync::types::errors::StoreError;
use raindrop_sync::types::tracked::TrackedItem;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> TrackingStore {
    TrackingStore::new(&StoreConfig::in_dir(dir.path()))
}

fn item(id: i64) -> TrackedItem {
    TrackedItem {
        id,
        created_time: "2023-08-01T10:00:00.000Z".to_string(),
        parsed_time: "2024-01-02T03:04:05.000+00:00".to_string(),
        title: format!("Bookmark {}", id),
        notes: String::new(),
        link: format!("https://example.com/{}", id),
    }
}

fn snapshot_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn pointer_target(store: &TrackingStore) -> PathBuf {
    PathBuf::from(fs::read_to_string(store.pointer_path()).unwrap().trim())
}

/// A store that has never been written bootstraps itself: one empty
/// snapshot with sequence 1 and a pointer to it.
#[test]
fn test_first_read_bootstraps_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let snapshot = store.latest_snapshot().unwrap();

    assert!(snapshot.is_empty());
    let files = snapshot_files(store.snapshot_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("001_processed_raindrops_"));
    assert!(files[0].ends_with(".json"));
    assert_eq!(pointer_target(&store), store.snapshot_dir().join(&files[0]));
}

#[test]
fn test_bootstrap_happens_once() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.latest_snapshot().unwrap();
    store.latest_snapshot().unwrap();
    store.current_snapshot_path().unwrap();

    assert_eq!(snapshot_files(store.snapshot_dir()).len(), 1);
}

/// Appending writes a new numbered snapshot holding the old items followed by
/// the new ones, and the previous snapshot stays byte-for-byte identical.
#[test]
fn test_append_creates_new_snapshot_and_keeps_old_one() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let first = store.append(&[item(100000001)]).unwrap();
    let first_bytes = fs::read(&first).unwrap();

    let second = store.append(&[item(100000002), item(100000003)]).unwrap();

    assert_ne!(first, second);
    assert_eq!(fs::read(&first).unwrap(), first_bytes);
    assert_eq!(pointer_target(&store), second);

    let latest = store.latest_snapshot().unwrap();
    let ids: Vec<i64> = latest.processed.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![100000001, 100000002, 100000003]);

    // bootstrap + two appends
    let files = snapshot_files(store.snapshot_dir());
    assert_eq!(files.len(), 3);
    assert!(files[2].starts_with("003_"));
}

#[test]
fn test_append_nothing_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let current = store.current_snapshot_path().unwrap();

    let after = store.append(&[]).unwrap();

    assert_eq!(after, current);
    assert_eq!(snapshot_files(store.snapshot_dir()).len(), 1);
}

#[test]
fn test_snapshot_is_pretty_printed_with_four_spaces() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let path = store.append(&[item(628161680)]).unwrap();
    let content = fs::read_to_string(path).unwrap();

    assert!(content.starts_with("{\n    \"Processed Raindrops\": [\n        {\n"));
    assert!(content.contains("\n            \"id\": 628161680,\n"));
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store.append(&[item(1)]).unwrap();

    assert!(snapshot_files(store.snapshot_dir())
        .iter()
        .all(|name| !name.starts_with('.')));
    let pointer_dir = store.pointer_path().parent().unwrap();
    assert_eq!(snapshot_files(pointer_dir), vec!["metafile.txt".to_string()]);
}

#[test]
fn test_tracked_ids_reflect_latest_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&[item(7), item(8)]).unwrap();

    let ids = store.tracked_ids().unwrap();

    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&7));
    assert!(ids.contains(&8));
}

/// Sequence numbers continue from the highest file on disk, even when the
/// pointer has been aimed at an older snapshot by hand.
#[test]
fn test_sequence_follows_highest_file_not_pointer() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let first = store.current_snapshot_path().unwrap();
    store.append(&[item(1)]).unwrap();
    store.append(&[item(2)]).unwrap();

    fs::write(store.pointer_path(), first.to_string_lossy().as_bytes()).unwrap();
    let next = store.append(&[item(3)]).unwrap();

    let name = next.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("004_"), "got {}", name);
    let ids: Vec<i64> = store
        .latest_snapshot()
        .unwrap()
        .processed
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![3]);
}

// === Corrupt store states are reported, never repaired ===

#[test]
fn test_missing_pointer_with_existing_snapshots_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.append(&[item(1)]).unwrap();
    fs::remove_file(store.pointer_path()).unwrap();

    let result = store.latest_snapshot();

    assert!(matches!(result, Err(StoreError::PointerMissing(_))));
    assert_eq!(snapshot_files(store.snapshot_dir()).len(), 2);
}

/// A first run that stopped after writing the empty snapshot but before the
/// pointer is finished on the next read instead of wedging the store.
#[test]
fn test_interrupted_bootstrap_is_completed() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let first = store.current_snapshot_path().unwrap();
    fs::remove_file(store.pointer_path()).unwrap();

    let snapshot = store.latest_snapshot().unwrap();

    assert!(snapshot.is_empty());
    assert_eq!(pointer_target(&store), first);
    assert_eq!(snapshot_files(store.snapshot_dir()).len(), 1);

    let next = store.append(&[item(1)]).unwrap();
    assert!(next
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("002_"));
}

/// Only an empty first snapshot counts as an interrupted bootstrap; a lone
/// snapshot with content still needs an operator.
#[test]
fn test_missing_pointer_with_lone_non_empty_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let first = store.current_snapshot_path().unwrap();
    fs::write(
        &first,
        serde_json::to_string(&serde_json::json!({ "Processed Raindrops": [item(1)] })).unwrap(),
    )
    .unwrap();
    fs::remove_file(store.pointer_path()).unwrap();

    assert!(matches!(
        store.latest_snapshot(),
        Err(StoreError::PointerMissing(_))
    ));
    assert!(!store.pointer_path().exists());
}

/// The pointer file holds the snapshot path verbatim, so a path that is not
/// UTF-8 is refused rather than written lossily.
#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_snapshot_path_is_refused() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        snapshot_dir: dir.path().join(OsStr::from_bytes(b"rts\xff.db")),
        pointer_path: dir.path().join("metafile").join("metafile.txt"),
    };
    let store = TrackingStore::new(&config);

    assert!(matches!(store.latest_snapshot(), Err(StoreError::Io(_))));
    assert!(!store.pointer_path().exists());
}

#[test]
fn test_empty_pointer_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.latest_snapshot().unwrap();
    fs::write(store.pointer_path(), "  \n").unwrap();

    assert!(matches!(
        store.latest_snapshot(),
        Err(StoreError::PointerUnreadable { .. })
    ));
}

#[test]
fn test_pointer_to_missing_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.latest_snapshot().unwrap();
    let gone = store
        .snapshot_dir()
        .join("009_processed_raindrops_20240101_0000.json");
    fs::write(store.pointer_path(), gone.to_string_lossy().as_bytes()).unwrap();

    match store.append(&[item(1)]) {
        Err(StoreError::SnapshotMissing(path)) => assert_eq!(path, gone),
        other => panic!("expected SnapshotMissing, got {:?}", other),
    }
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let current = store.current_snapshot_path().unwrap();
    fs::write(&current, "{ not json").unwrap();

    assert!(matches!(
        store.latest_snapshot(),
        Err(StoreError::SnapshotCorrupt { .. })
    ));
    assert!(matches!(
        store.append(&[item(1)]),
        Err(StoreError::SnapshotCorrupt { .. })
    ));
}

#[test]
fn test_snapshot_without_processed_key_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let current = store.current_snapshot_path().unwrap();
    fs::write(&current, "{\"something\": []}").unwrap();

    assert!(matches!(
        store.latest_snapshot(),
        Err(StoreError::SnapshotCorrupt { .. })
    ));
}
