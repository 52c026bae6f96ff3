//! Framing Tests
//!
//! Length-prefixed frames over in-memory streams.

use std::io::{Cursor, ErrorKind};

use elevator::protocol::{encode_frame, read_frame, write_frame, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use elevator::ElevatorError;

// =============================================================================
// Frame Layout Tests
// =============================================================================

#[test]
fn test_frame_is_big_endian_length_prefixed() {
    let frame = encode_frame(b"hello").unwrap();

    assert_eq!(frame.len(), HEADER_SIZE + 5);
    assert_eq!(&frame[..HEADER_SIZE], &[0, 0, 0, 5]);
    assert_eq!(&frame[HEADER_SIZE..], b"hello");
}

#[test]
fn test_empty_payload_frame() {
    let frame = encode_frame(b"").unwrap();
    assert_eq!(frame, vec![0, 0, 0, 0]);

    let mut cursor = Cursor::new(frame);
    assert!(read_frame(&mut cursor).unwrap().is_empty());
}

#[test]
fn test_back_to_back_frames() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, b"first").unwrap();
    write_frame(&mut buffer, b"second").unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_frame(&mut cursor).unwrap(), b"first");
    assert_eq!(read_frame(&mut cursor).unwrap(), b"second");
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_oversize_length_rejected_before_reading_payload() {
    let mut cursor = Cursor::new((MAX_PAYLOAD_SIZE + 1).to_be_bytes().to_vec());
    assert!(matches!(read_frame(&mut cursor), Err(ElevatorError::Protocol(_))));
}

#[test]
fn test_oversize_payload_not_encoded() {
    let payload = vec![0u8; MAX_PAYLOAD_SIZE as usize + 1];
    assert!(matches!(encode_frame(&payload), Err(ElevatorError::Protocol(_))));
}

#[test]
fn test_truncated_frame_is_eof() {
    let mut frame = encode_frame(b"complete").unwrap();
    frame.truncate(frame.len() - 3);

    let mut cursor = Cursor::new(frame);
    match read_frame(&mut cursor) {
        Err(ElevatorError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected EOF, got {:?}", other),
    }
}
