//! Tests for data commands
//!
//! These tests verify:
//! - GET/PUT/DELETE/EXISTS
//! - MGET partial results
//! - RANGE and SLICE over snapshots, with key/value selection
//! - BATCH validation and atomicity
//! - Argument count and type errors

use elevator::protocol::{ErrorCode, Status, Value};

use super::{assert_failure, assert_success, pair, s, Fixture};

// =============================================================================
// Helper Functions
// =============================================================================

fn seeded() -> Fixture {
    let fixture = Fixture::new();
    for (key, value) in [("1", "11"), ("2", "12"), ("3", "13")] {
        assert_success(&fixture.data("PUT", vec![s(key), s(value)]));
    }
    fixture
}

// =============================================================================
// Point Command Tests
// =============================================================================

#[test]
fn test_put_then_get() {
    let fixture = Fixture::new();

    let put = fixture.data("PUT", vec![s("key"), s("value")]);
    assert_success(&put);
    assert!(put.datas().is_empty());

    let get = fixture.data("GET", vec![s("key")]);
    assert_success(&get);
    assert_eq!(get.datas(), &[s("value")]);
}

#[test]
fn test_get_missing_is_key_error() {
    let fixture = Fixture::new();
    assert_failure(&fixture.data("GET", vec![s("nope")]), ErrorCode::KeyError);
}

#[test]
fn test_binary_values_come_back_as_bytes() {
    let fixture = Fixture::new();
    let raw = Value::Bytes(vec![0xff, 0x00, 0xfe]);

    assert_success(&fixture.data("PUT", vec![s("bin"), raw.clone()]));
    assert_eq!(fixture.data("GET", vec![s("bin")]).datas(), &[raw]);
}

#[test]
fn test_delete_is_idempotent() {
    let fixture = Fixture::new();
    assert_success(&fixture.data("PUT", vec![s("k"), s("v")]));

    assert_success(&fixture.data("DELETE", vec![s("k")]));
    assert_success(&fixture.data("DELETE", vec![s("k")]));
    assert_success(&fixture.data("DELETE", vec![s("never")]));
    assert_failure(&fixture.data("GET", vec![s("k")]), ErrorCode::KeyError);
}

#[test]
fn test_exists() {
    let fixture = Fixture::new();
    assert_success(&fixture.data("PUT", vec![s("k"), s("v")]));

    assert_eq!(fixture.data("EXISTS", vec![s("k")]).datas(), &[Value::Bool(true)]);
    assert_eq!(fixture.data("EXISTS", vec![s("x")]).datas(), &[Value::Bool(false)]);
}

// =============================================================================
// Multi-key Read Tests
// =============================================================================

#[test]
fn test_range_slice_mget_scenario() {
    let fixture = seeded();

    let range = fixture.data("RANGE", vec![s("1"), s("2")]);
    assert_success(&range);
    assert_eq!(range.datas(), &[pair("1", "11"), pair("2", "12")]);

    let slice = fixture.data("SLICE", vec![s("1"), Value::Int(2)]);
    assert_success(&slice);
    assert_eq!(slice.datas(), range.datas());

    let mget = fixture.data("MGET", vec![Value::List(vec![s("1"), s("2"), s("x")])]);
    assert_eq!(mget.status(), Status::Warning);
    assert_eq!(mget.datas(), &[s("11"), s("12"), Value::Null]);
}

#[test]
fn test_mget_all_present_is_success() {
    let fixture = seeded();
    let mget = fixture.data("MGET", vec![Value::List(vec![s("3"), s("1")])]);
    assert_success(&mget);
    assert_eq!(mget.datas(), &[s("13"), s("11")]);
}

#[test]
fn test_mget_empty_list() {
    let fixture = seeded();
    let mget = fixture.data("MGET", vec![Value::List(vec![])]);
    assert_success(&mget);
    assert!(mget.datas().is_empty());
}

#[test]
fn test_range_key_and_value_selection() {
    let fixture = seeded();

    let keys = fixture.data("RANGE", vec![s("1"), s("3"), Value::Bool(true), Value::Bool(false)]);
    assert_eq!(keys.datas(), &[s("1"), s("2"), s("3")]);

    let values = fixture.data("RANGE", vec![s("2"), s("3"), Value::Bool(false), Value::Bool(true)]);
    assert_eq!(values.datas(), &[s("12"), s("13")]);

    let neither = fixture.data("RANGE", vec![s("1"), s("3"), Value::Bool(false), Value::Bool(false)]);
    assert_failure(&neither, ErrorCode::ValueError);

    let null_defaults = fixture.data("RANGE", vec![s("3"), s("3"), Value::Null, Value::Null]);
    assert_eq!(null_defaults.datas(), &[pair("3", "13")]);
}

#[test]
fn test_range_bounds_between_keys() {
    let fixture = seeded();

    let inner = fixture.data("RANGE", vec![s("15"), s("25")]);
    assert_eq!(inner.datas(), &[pair("2", "12")]);

    let inverted = fixture.data("RANGE", vec![s("3"), s("1")]);
    assert_success(&inverted);
    assert!(inverted.datas().is_empty());
}

#[test]
fn test_slice_stops_at_end_of_keyspace() {
    let fixture = seeded();

    let slice = fixture.data("SLICE", vec![s("2"), Value::Int(10)]);
    assert_success(&slice);
    assert_eq!(slice.datas(), &[pair("2", "12"), pair("3", "13")]);

    let empty = fixture.data("SLICE", vec![s("9"), Value::Int(10)]);
    assert!(empty.datas().is_empty());

    let zero = fixture.data("SLICE", vec![s("1"), Value::Int(0)]);
    assert!(zero.datas().is_empty());
}

#[test]
fn test_slice_negative_limit_is_value_error() {
    let fixture = seeded();
    assert_failure(&fixture.data("SLICE", vec![s("1"), Value::Int(-1)]), ErrorCode::ValueError);
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_applies_everything() {
    let fixture = seeded();
    let batch = Value::List(vec![
        Value::List(vec![s("PUT"), s("4"), s("14")]),
        Value::List(vec![s("DELETE"), s("1")]),
        Value::List(vec![s("PUT"), s("2"), s("22")]),
    ]);

    assert_success(&fixture.data("BATCH", vec![batch]));

    let all = fixture.data("SLICE", vec![s(""), Value::Int(10)]);
    assert_eq!(all.datas(), &[pair("2", "22"), pair("3", "13"), pair("4", "14")]);
}

#[test]
fn test_batch_errors_leave_database_untouched() {
    let cases = [
        (
            vec![
                Value::List(vec![s("PUT"), s("a"), s("1")]),
                Value::List(vec![s("BPUT"), s("b"), s("2")]),
            ],
            ErrorCode::SignalError,
        ),
        (
            vec![
                Value::List(vec![s("PUT"), s("a"), s("1")]),
                Value::List(vec![s("PUT"), s("b")]),
            ],
            ErrorCode::ValueError,
        ),
        (
            vec![
                Value::List(vec![s("DELETE"), s("1")]),
                Value::List(vec![s("PUT"), s("b"), Value::Int(2)]),
            ],
            ErrorCode::TypeError,
        ),
        (
            vec![Value::List(vec![Value::Int(1), s("a"), s("1")])],
            ErrorCode::TypeError,
        ),
        (
            vec![Value::List(vec![s("DELETE"), s("1")]), s("not a list")],
            ErrorCode::ValueError,
        ),
    ];

    for (items, code) in cases {
        let fixture = seeded();
        assert_failure(&fixture.data("BATCH", vec![Value::List(items)]), code);

        let all = fixture.data("SLICE", vec![s(""), Value::Int(10)]);
        assert_eq!(all.datas(), &[pair("1", "11"), pair("2", "12"), pair("3", "13")]);
    }
}

#[test]
fn test_empty_batch_succeeds() {
    let fixture = Fixture::new();
    assert_success(&fixture.data("BATCH", vec![Value::List(vec![])]));
}

// =============================================================================
// Argument Tests
// =============================================================================

#[test]
fn test_wrong_argument_count_is_value_error() {
    let fixture = Fixture::new();
    assert_failure(&fixture.data("GET", vec![]), ErrorCode::ValueError);
    assert_failure(&fixture.data("PUT", vec![s("k")]), ErrorCode::ValueError);
    assert_failure(&fixture.data("DELETE", vec![s("a"), s("b")]), ErrorCode::ValueError);
}

#[test]
fn test_wrong_argument_type_is_type_error() {
    let fixture = Fixture::new();
    assert_failure(&fixture.data("GET", vec![Value::Int(1)]), ErrorCode::TypeError);
    assert_failure(&fixture.data("MGET", vec![s("k")]), ErrorCode::TypeError);
    assert_failure(
        &fixture.data("MGET", vec![Value::List(vec![Value::Bool(true)])]),
        ErrorCode::TypeError,
    );
    assert_failure(&fixture.data("SLICE", vec![s("a"), s("2")]), ErrorCode::TypeError);
    assert_failure(&fixture.data("BATCH", vec![s("PUT")]), ErrorCode::TypeError);
}
