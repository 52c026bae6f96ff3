//! Tests for StorageManager
//!
//! These tests verify:
//! - Flushing memtable snapshots into tables
//! - Newest-first lookups and tombstone shadowing
//! - Reopen discovery
//! - Compaction
//! - Quarantine of corrupt tables

use std::fs;

use elevator::engine::EngineOptions;
use elevator::memtable::MemTable;
use elevator::storage::StorageManager;
use elevator::ElevatorError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn flush_pairs(storage: &StorageManager, pairs: &[(&str, Option<&str>)]) {
    let table = MemTable::new();
    for (key, value) in pairs {
        match value {
            Some(v) => table.put(key.as_bytes().to_vec(), v.as_bytes().to_vec()),
            None => table.delete(key.as_bytes().to_vec()),
        };
    }
    storage.flush(&table.snapshot()).unwrap();
}

fn get(storage: &StorageManager, key: &str) -> Option<String> {
    storage
        .get(key.as_bytes())
        .unwrap()
        .map(|v| String::from_utf8(v).unwrap())
}

// =============================================================================
// Flush and Lookup Tests
// =============================================================================

#[test]
fn test_flush_creates_numbered_tables() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    flush_pairs(&storage, &[("a", Some("1"))]);
    flush_pairs(&storage, &[("b", Some("2"))]);

    assert_eq!(storage.sstable_count(), 2);
    assert!(temp.path().join("sstable_000001.sst").exists());
    assert!(temp.path().join("sstable_000002.sst").exists());
    assert_eq!(storage.next_sstable_id(), 3);
}

#[test]
fn test_flush_of_empty_snapshot_rejected() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    let result = storage.flush(&MemTable::new().snapshot());
    assert!(matches!(result, Err(ElevatorError::Storage(_))));
}

#[test]
fn test_newest_table_wins() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    flush_pairs(&storage, &[("k", Some("old")), ("gone", Some("x"))]);
    flush_pairs(&storage, &[("k", Some("new")), ("gone", None)]);

    assert_eq!(get(&storage, "k").as_deref(), Some("new"));
    assert_eq!(get(&storage, "gone"), None);
    assert_eq!(get(&storage, "never"), None);
}

#[test]
fn test_reopen_discovers_tables_newest_first() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        flush_pairs(&storage, &[("k", Some("v1"))]);
        flush_pairs(&storage, &[("k", Some("v2"))]);
    }
    fs::write(temp.path().join("notes.txt"), b"not a table").unwrap();

    let storage = StorageManager::open(temp.path()).unwrap();
    assert_eq!(storage.sstable_count(), 2);
    assert_eq!(get(&storage, "k").as_deref(), Some("v2"));
    assert_eq!(storage.next_sstable_id(), 3);

    let ids: Vec<u64> = storage.tables().iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[test]
fn test_zero_cache_still_serves_reads() {
    let temp = TempDir::new().unwrap();
    let options = EngineOptions {
        block_cache_size: 0,
        ..EngineOptions::default()
    };
    let storage = StorageManager::open_with(temp.path(), &options).unwrap();
    flush_pairs(&storage, &[("k", Some("v"))]);

    assert_eq!(get(&storage, "k").as_deref(), Some("v"));
    assert_eq!(get(&storage, "k").as_deref(), Some("v"));
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_merges_and_drops_tombstones() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    flush_pairs(&storage, &[("a", Some("1")), ("b", Some("2"))]);
    flush_pairs(&storage, &[("b", None), ("c", Some("3"))]);
    flush_pairs(&storage, &[("a", Some("10"))]);

    storage.compact().unwrap();

    assert_eq!(storage.sstable_count(), 1);
    assert_eq!(storage.tables()[0].entry_count(), 2);
    assert_eq!(get(&storage, "a").as_deref(), Some("10"));
    assert_eq!(get(&storage, "b"), None);
    assert_eq!(get(&storage, "c").as_deref(), Some("3"));

    let files = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn test_compact_everything_deleted_leaves_no_tables() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();

    flush_pairs(&storage, &[("a", Some("1"))]);
    flush_pairs(&storage, &[("a", None)]);
    storage.compact().unwrap();

    assert_eq!(storage.sstable_count(), 0);
    assert_eq!(get(&storage, "a"), None);
}

#[test]
fn test_snapshot_tables_survive_compaction() {
    let temp = TempDir::new().unwrap();
    let storage = StorageManager::open(temp.path()).unwrap();
    flush_pairs(&storage, &[("a", Some("1"))]);
    flush_pairs(&storage, &[("b", Some("2"))]);

    let pinned = storage.tables();
    storage.compact().unwrap();

    // Files are unlinked but the open readers keep working
    assert_eq!(pinned[0].get(b"b").unwrap(), Some(Some(b"2".to_vec())));
    assert_eq!(pinned[1].get(b"a").unwrap(), Some(Some(b"1".to_vec())));
}

// =============================================================================
// Quarantine Tests
// =============================================================================

#[test]
fn test_quarantine_renames_only_corrupt_tables() {
    let temp = TempDir::new().unwrap();
    {
        let storage = StorageManager::open(temp.path()).unwrap();
        flush_pairs(&storage, &[("a", Some("healthy"))]);
        flush_pairs(&storage, &[("b", Some("damaged"))]);
    }

    let victim = temp.path().join("sstable_000002.sst");
    let mut bytes = fs::read(&victim).unwrap();
    bytes[14 + 8 + 1] ^= 0xFF;
    fs::write(&victim, &bytes).unwrap();

    assert_eq!(StorageManager::quarantine_corrupt(temp.path()).unwrap(), 1);
    assert!(!victim.exists());
    assert!(temp.path().join("sstable_000002.corrupt").exists());
    assert!(temp.path().join("sstable_000001.sst").exists());

    let storage = StorageManager::open(temp.path()).unwrap();
    assert_eq!(storage.sstable_count(), 1);
    assert_eq!(get(&storage, "a").as_deref(), Some("healthy"));
}

#[test]
fn test_quarantine_missing_dir_is_noop() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");
    assert_eq!(StorageManager::quarantine_corrupt(&missing).unwrap(), 0);
}
