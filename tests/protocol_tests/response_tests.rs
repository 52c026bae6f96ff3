//! Response Tests
//!
//! Two-frame responses, status and error codes, content compression.

use std::io::Cursor;

use elevator::protocol::{
    decode_response, encode_response, encode_response_frames, read_frame, read_response,
    write_response, ErrorCode, Response, Status, Value,
};
use elevator::ElevatorError;

// =============================================================================
// Helper Functions
// =============================================================================

fn large_response() -> Response {
    let datas = (0..500)
        .map(|i| Value::List(vec![Value::from(format!("key-{i:04}")), Value::from("x".repeat(64))]))
        .collect();
    Response::success(datas)
}

// =============================================================================
// Status Tests
// =============================================================================

#[test]
fn test_success_round_trip() {
    let response = Response::success(vec![Value::from("PONG")]);
    let (header, content) = encode_response(&response, false).unwrap();

    let decoded = decode_response(&header, &content).unwrap();
    assert_eq!(decoded.status(), Status::Success);
    assert_eq!(decoded.datas(), &[Value::from("PONG")]);
    assert_eq!(decoded.err_code(), None);
}

#[test]
fn test_warning_keeps_null_elements() {
    let response = Response::warning(vec![Value::from("a"), Value::Null]);
    let (header, content) = encode_response(&response, false).unwrap();

    let decoded = decode_response(&header, &content).unwrap();
    assert_eq!(decoded.status(), Status::Warning);
    assert!(decoded.datas()[1].is_null());
}

#[test]
fn test_failure_carries_code_and_message() {
    let response = Response::from(ElevatorError::Signal("BPUT".to_string()));
    assert_eq!(response.status(), Status::Failure);

    let mut buffer = Vec::new();
    write_response(&mut buffer, &response, false).unwrap();
    let decoded = read_response(&mut Cursor::new(buffer)).unwrap();

    assert_eq!(decoded.err_code(), Some(ErrorCode::SignalError));
    assert!(decoded.header.err_msg.as_ref().unwrap().contains("BPUT"));
    assert!(decoded.datas().is_empty());
}

#[test]
fn test_status_wire_values() {
    assert_eq!(i8::from(Status::Success), 1);
    assert_eq!(i8::from(Status::Failure), -1);
    assert_eq!(i8::from(Status::Warning), -2);
    assert!(Status::try_from(0i8).is_err());
}

#[test]
fn test_error_code_wire_values() {
    assert_eq!(u8::from(ErrorCode::TypeError), 0);
    assert_eq!(u8::from(ErrorCode::RequestError), 8);
    assert_eq!(ErrorCode::try_from(6u8).unwrap(), ErrorCode::DatabaseError);
    assert!(ErrorCode::try_from(9u8).is_err());
}

// =============================================================================
// Compression Tests
// =============================================================================

#[test]
fn test_compressed_content_round_trip() {
    let response = large_response();
    let (plain_header, plain) = encode_response(&response, false).unwrap();
    let (header, compressed) = encode_response(&response, true).unwrap();

    assert!(compressed.len() < plain.len());
    assert_ne!(header, plain_header);

    let decoded = decode_response(&header, &compressed).unwrap();
    assert!(decoded.header.compression);
    assert_eq!(decoded.content, response.content);
}

#[test]
fn test_header_frame_never_compressed() {
    let frames = encode_response_frames(&large_response(), true).unwrap();
    let mut cursor = Cursor::new(frames);

    let header = read_frame(&mut cursor).unwrap();
    let content = read_frame(&mut cursor).unwrap();

    let decoded = decode_response(&header, &content).unwrap();
    assert_eq!(decoded.status(), Status::Success);
    assert_eq!(decoded.datas().len(), 500);
}

#[test]
fn test_corrupt_compressed_content_is_protocol_error() {
    let (header, mut content) = encode_response(&large_response(), true).unwrap();
    content.truncate(content.len() / 2);

    assert!(matches!(
        decode_response(&header, &content),
        Err(ElevatorError::Protocol(_))
    ));
}
