//! Tests for the append-only content store and its snapshots

use kodegen_tools_snapcrawl::content_store::{
    ContentStore, InsertRecord, StoreError, StoreMode,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

mod common;

fn record(i: usize) -> InsertRecord {
    InsertRecord::new(
        common::create_test_html(&format!("Page {i}"), &[]).into_bytes(),
        common::test_url(&format!("/articles/{i}.html")),
        format!("Page {i}"),
    )
}

fn blob_names(store_dir: &Path) -> BTreeSet<String> {
    fs::read_dir(store_dir.join("contents"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_full_load_round_trip_preserves_order_and_fields() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");

    let store = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    for i in 0..5 {
        store.insert(record(i)).unwrap();
    }
    let before = store.entries();
    store.save().unwrap();

    let reloaded = ContentStore::open(&dir, StoreMode::FullLoad).unwrap();
    assert_eq!(reloaded.entries(), before);
    for entry in &before {
        let bytes = reloaded.read_content(entry).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains(&entry.title));
    }
}

#[test]
fn test_filenames_are_unique_and_one_file_per_insert() {
    let temp = TempDir::new().unwrap();
    let store = ContentStore::open(temp.path().join("store"), StoreMode::Fresh).unwrap();

    let names: BTreeSet<String> = (0..20)
        .map(|i| store.insert(record(i)).unwrap().content_filename)
        .collect();
    assert_eq!(names.len(), 20);
    assert_eq!(blob_names(store.dir()), names);
}

#[test]
fn test_append_mode_merges_on_save() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");

    let first = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    first.insert(record(0)).unwrap();
    first.insert(record(1)).unwrap();
    first.save().unwrap();
    drop(first);

    let appender = ContentStore::open(&dir, StoreMode::Append).unwrap();
    assert!(appender.is_empty());
    let third = appender.insert(record(2)).unwrap();
    appender.save().unwrap();
    assert!(appender.is_empty());

    let full = ContentStore::open(&dir, StoreMode::FullLoad).unwrap();
    let entries = full.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2], third);
    // The counter survives reopening, so no filename is reused
    let distinct: BTreeSet<_> = entries.iter().map(|e| &e.content_filename).collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_fresh_mode_clears_existing_content() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");

    let store = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    store.insert(record(0)).unwrap();
    store.save().unwrap();
    drop(store);

    let again = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    assert!(again.is_empty());
    assert!(blob_names(&dir).is_empty());
}

#[test]
fn test_open_missing_store_is_not_found() {
    let temp = TempDir::new().unwrap();
    let result = ContentStore::open(temp.path().join("absent"), StoreMode::FullLoad);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_corrupt_entry_log_is_reported() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");
    let store = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    store.save().unwrap();

    fs::write(dir.join("entries.json"), b"{ not json").unwrap();
    let result = ContentStore::open(&dir, StoreMode::FullLoad);
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn test_snapshot_restore_rolls_back_and_removes_orphans() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");

    let store = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    for i in 0..3 {
        store.insert(record(i)).unwrap();
    }
    let at_snapshot = store.entries();
    let blobs_at_snapshot = blob_names(&dir);
    store.snapshot("20240101_000000_000000").unwrap();

    for i in 3..6 {
        store.insert(record(i)).unwrap();
    }
    store.save().unwrap();
    store.snapshot("20240102_000000_000000").unwrap();
    drop(store);

    let restored = ContentStore::restore_snapshot(&dir, "20240101_000000_000000").unwrap();
    assert_eq!(restored.mode(), StoreMode::FullLoad);
    assert_eq!(restored.entries(), at_snapshot);
    assert_eq!(blob_names(&dir), blobs_at_snapshot);

    // Newer snapshots are gone; the restored one stays
    assert!(dir.join("snapshots/20240101_000000_000000").exists());
    assert!(!dir.join("snapshots/20240102_000000_000000").exists());

    // The live log was rewritten too
    let reopened = ContentStore::open(&dir, StoreMode::FullLoad).unwrap();
    assert_eq!(reopened.entries(), at_snapshot);

    // New inserts after restore do not reuse filenames still on disk
    let next = reopened.insert(record(9)).unwrap();
    assert!(!blobs_at_snapshot.contains(&next.content_filename));
}

#[test]
fn test_restore_detects_missing_blob() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");

    let store = ContentStore::open(&dir, StoreMode::Fresh).unwrap();
    let entry = store.insert(record(0)).unwrap();
    store.snapshot("20240101_000000_000000").unwrap();
    fs::remove_file(store.content_path(&entry)).unwrap();
    drop(store);

    let result = ContentStore::restore_snapshot(&dir, "20240101_000000_000000");
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn test_store_mode_parses_aliases() {
    assert_eq!("fresh".parse::<StoreMode>().unwrap(), StoreMode::Fresh);
    assert_eq!("overwrite".parse::<StoreMode>().unwrap(), StoreMode::Fresh);
    assert_eq!("append".parse::<StoreMode>().unwrap(), StoreMode::Append);
    assert_eq!("full-load".parse::<StoreMode>().unwrap(), StoreMode::FullLoad);
    assert!(matches!(
        "sometimes".parse::<StoreMode>(),
        Err(StoreError::InvalidMode(_))
    ));
}
