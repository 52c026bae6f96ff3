//! Tests for MergeIterator
//!
//! These tests verify:
//! - Ascending output across sources
//! - Newest source wins on duplicate keys
//! - Tombstones hidden (or kept on request)
//! - Source errors surface once and end the stream

use elevator::storage::{EntrySource, MergeIterator};
use elevator::{ElevatorError, Result};

// =============================================================================
// Helper Functions
// =============================================================================

fn source(entries: &[(&str, Option<&str>)]) -> EntrySource {
    let owned: Vec<Result<(Vec<u8>, Option<Vec<u8>>)>> = entries
        .iter()
        .map(|(k, v)| Ok((k.as_bytes().to_vec(), v.map(|v| v.as_bytes().to_vec()))))
        .collect();
    Box::new(owned.into_iter())
}

fn collect(iter: MergeIterator) -> Vec<(String, Option<String>)> {
    iter.map(|entry| {
        let (k, v) = entry.unwrap();
        (
            String::from_utf8(k).unwrap(),
            v.map(|v| String::from_utf8(v).unwrap()),
        )
    })
    .collect()
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_interleaved_sources_sorted() {
    let merged = collect(MergeIterator::new(vec![
        source(&[("b", Some("2")), ("d", Some("4"))]),
        source(&[("a", Some("1")), ("c", Some("3")), ("e", Some("5"))]),
    ]));

    let keys: Vec<&str> = merged.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_first_source_shadows_later_ones() {
    let merged = collect(MergeIterator::new(vec![
        source(&[("k", Some("newest"))]),
        source(&[("k", Some("middle"))]),
        source(&[("k", Some("oldest"))]),
    ]));

    assert_eq!(merged, vec![("k".to_string(), Some("newest".to_string()))]);
}

#[test]
fn test_tombstone_hides_older_value() {
    let newer = &[("a", None), ("b", Some("2"))];
    let older = &[("a", Some("1"))];

    let hidden = collect(MergeIterator::new(vec![source(newer), source(older)]));
    assert_eq!(hidden, vec![("b".to_string(), Some("2".to_string()))]);

    let kept = collect(MergeIterator::new(vec![source(newer), source(older)]).with_tombstones());
    assert_eq!(kept[0], ("a".to_string(), None));
    assert_eq!(kept.len(), 2);
}

#[test]
fn test_empty_sources() {
    assert!(collect(MergeIterator::new(Vec::new())).is_empty());
    assert!(collect(MergeIterator::new(vec![source(&[]), source(&[])])).is_empty());
}

#[test]
fn test_source_error_ends_stream() {
    let failing: EntrySource = Box::new(
        vec![
            Ok((b"a".to_vec(), Some(b"1".to_vec()))),
            Err(ElevatorError::Storage("disk".to_string())),
        ]
        .into_iter(),
    );

    let results: Vec<_> = MergeIterator::new(vec![failing]).collect();
    assert!(results.iter().any(|r| r.is_err()));
    assert!(matches!(results.last(), Some(Err(_))));
}
