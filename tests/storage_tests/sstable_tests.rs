//! Tests for SSTable builder and reader
//!
//! These tests verify:
//! - Building and reading tables, including tombstones
//! - Key ordering enforcement
//! - Header-only presence probes
//! - Checksum verification and paranoid opens
//! - Cursors from a start bound

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use elevator::storage::{SSTableBuilder, SSTableCursor, SSTableReader};
use elevator::ElevatorError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn table_path(dir: &TempDir) -> PathBuf {
    dir.path().join("sstable_000001.sst")
}

/// keys "a".."e" with values "A".."E", and a tombstone at "c"
fn build_sample(path: &Path) {
    let mut builder = SSTableBuilder::new(path).unwrap();
    builder.add(b"a", b"A").unwrap();
    builder.add(b"b", b"B").unwrap();
    builder.add_tombstone(b"c").unwrap();
    builder.add(b"d", b"D").unwrap();
    builder.add(b"e", b"E").unwrap();
    builder.finish().unwrap();
}

// =============================================================================
// Build and Read Tests
// =============================================================================

#[test]
fn test_finish_reports_metadata() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);

    let mut builder = SSTableBuilder::new(&path).unwrap();
    builder.add(b"apple", b"1").unwrap();
    builder.add(b"banana", b"2").unwrap();
    let table = builder.finish().unwrap();

    assert_eq!(table.entry_count(), 2);
    assert_eq!(table.min_key, b"apple".to_vec());
    assert_eq!(table.max_key, b"banana".to_vec());
    assert_eq!(table.file_size, fs::metadata(&path).unwrap().len());
    assert!(table.might_contain(b"avocado"));
    assert!(!table.might_contain(b"cherry"));
}

#[test]
fn test_reader_get_values_and_tombstones() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);

    let reader = SSTableReader::open(&path, 1).unwrap();
    assert_eq!(reader.entry_count(), 5);
    assert_eq!(reader.get(b"a").unwrap(), Some(Some(b"A".to_vec())));
    assert_eq!(reader.get(b"c").unwrap(), Some(None));
    assert_eq!(reader.get(b"z").unwrap(), None);
    assert_eq!(reader.min_key(), Some(&b"a"[..]));
    assert_eq!(reader.max_key(), Some(&b"e"[..]));
}

#[test]
fn test_probe_distinguishes_live_deleted_and_unknown() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);

    let reader = SSTableReader::open(&path, 1).unwrap();
    assert_eq!(reader.probe(b"b").unwrap(), Some(true));
    assert_eq!(reader.probe(b"c").unwrap(), Some(false));
    assert_eq!(reader.probe(b"bb").unwrap(), None);
}

#[test]
fn test_out_of_order_keys_rejected() {
    let temp = TempDir::new().unwrap();
    let mut builder = SSTableBuilder::new(&table_path(&temp)).unwrap();
    builder.add(b"m", b"1").unwrap();

    assert!(matches!(builder.add(b"a", b"2"), Err(ElevatorError::Storage(_))));
    assert!(matches!(builder.add(b"m", b"3"), Err(ElevatorError::Storage(_))));
}

#[test]
fn test_small_block_size_round_trips_large_values() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    let big = vec![7u8; 64 * 1024];

    let mut builder = SSTableBuilder::with_block_size(&path, 512).unwrap();
    builder.add(b"big", &big).unwrap();
    builder.add(b"small", b"s").unwrap();
    builder.finish().unwrap();

    let reader = SSTableReader::open_with(&path, 1, 512, true).unwrap();
    assert_eq!(reader.get(b"big").unwrap(), Some(Some(big)));
}

// =============================================================================
// Integrity Tests
// =============================================================================

#[test]
fn test_bad_magic_rejected() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(SSTableReader::open(&path, 1), Err(ElevatorError::Storage(_))));
}

#[test]
fn test_flipped_value_fails_verify() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);

    // Header (14) + key_len (4) + val_len (4) + key "a" (1) → value of "a"
    let mut bytes = fs::read(&path).unwrap();
    bytes[14 + 8 + 1] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let lenient = SSTableReader::open(&path, 1).unwrap();
    assert!(!lenient.verify().unwrap());

    assert!(matches!(
        SSTableReader::open_with(&path, 1, 4096, true),
        Err(ElevatorError::Storage(_))
    ));
}

#[test]
fn test_intact_table_verifies() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);

    let reader = SSTableReader::open(&path, 1).unwrap();
    assert!(reader.verify().unwrap());
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[test]
fn test_cursor_from_bound_yields_tombstones() {
    let temp = TempDir::new().unwrap();
    let path = table_path(&temp);
    build_sample(&path);
    let reader = Arc::new(SSTableReader::open(&path, 1).unwrap());

    let all: Vec<_> = SSTableCursor::new(Arc::clone(&reader), Bound::Unbounded)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[2], (b"c".to_vec(), None));

    let from_bb: Vec<Vec<u8>> = SSTableCursor::new(reader, Bound::Included(b"bb".to_vec()))
        .map(|entry| entry.unwrap().0)
        .collect();
    assert_eq!(from_bb, vec![b"c".to_vec(), b"d".to_vec(), b"e".to_vec()]);
}
