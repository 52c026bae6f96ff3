//! Request Tests
//!
//! Request encoding, decoding and validation.

use std::collections::BTreeMap;
use std::io::Cursor;

use elevator::protocol::{
    decode_request, encode_request, read_request, write_request, ErrorCode, Request, Value,
    WireRequest, META_AUTH, META_COMPRESSION,
};
use elevator::ElevatorError;

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_request_round_trip_with_every_value_kind() {
    let mut options = BTreeMap::new();
    options.insert("block_size".to_string(), Value::Int(8192));

    let request = Request::new(
        "BATCH",
        vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-7),
            Value::from("text"),
            Value::from(&b"\x00\xff"[..]),
            Value::List(vec![Value::from("PUT"), Value::from("k"), Value::from("v")]),
            Value::Map(options),
        ],
    )
    .with_uid("0b7e6f2a")
    .with_meta(META_COMPRESSION, true);

    let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn test_request_over_stream() {
    let request = Request::new("GET", vec![Value::from("key")]).with_uid("uid-1");

    let mut buffer = Vec::new();
    write_request(&mut buffer, &request).unwrap();

    let decoded = read_request(&mut Cursor::new(buffer)).unwrap();
    assert_eq!(decoded.cmd, "GET");
    assert_eq!(decoded.uid.as_deref(), Some("uid-1"));
}

// =============================================================================
// Meta Tests
// =============================================================================

#[test]
fn test_compression_flag_defaults_off() {
    let plain = Request::new("PING", vec![]);
    assert!(!plain.wants_compression());

    let compressed = plain.clone().with_meta(META_COMPRESSION, true);
    assert!(compressed.wants_compression());

    let odd = plain.with_meta(META_COMPRESSION, "yes");
    assert!(!odd.wants_compression());
}

#[test]
fn test_auth_meta() {
    let request = Request::new("PING", vec![]).with_meta(META_AUTH, "s3cret");
    assert_eq!(request.auth(), Some("s3cret"));
    assert_eq!(Request::new("PING", vec![]).auth(), None);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_missing_cmd_is_request_error() {
    let wire = WireRequest {
        args: Some(vec![]),
        ..WireRequest::default()
    };
    let payload = bincode::serialize(&wire).unwrap();

    let err = decode_request(&payload).unwrap_err();
    assert!(matches!(err, ElevatorError::Request(_)));
    assert_eq!(err.code(), ErrorCode::RequestError);
}

#[test]
fn test_missing_args_is_request_error() {
    let wire = WireRequest {
        cmd: Some("GET".to_string()),
        ..WireRequest::default()
    };
    let payload = bincode::serialize(&wire).unwrap();

    assert!(matches!(decode_request(&payload), Err(ElevatorError::Request(_))));
}

#[test]
fn test_garbage_payload_is_request_error() {
    let err = decode_request(&[0xFF, 0x13, 0x37]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequestError);
}

#[test]
fn test_absent_meta_decodes_empty() {
    let wire = WireRequest {
        cmd: Some("PING".to_string()),
        args: Some(vec![]),
        ..WireRequest::default()
    };
    let payload = bincode::serialize(&wire).unwrap();

    let request = decode_request(&payload).unwrap();
    assert!(request.meta.is_empty());
    assert!(request.uid.is_none());
}
