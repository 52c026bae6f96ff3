//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every frame is a big-endian length followed by a bincode payload:
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │         Payload             │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! - Request:  one frame  `{ meta, uid, cmd, args }`
//! - Response: two frames `{ status, err_code, err_msg, compression }`
//!   then `{ datas }`. Only the content frame is ever compressed (LZ4,
//!   size-prepended).

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use super::{Request, Response, ResponseContent, ResponseHeader, WireRequest};
use crate::error::{ElevatorError, Result};

/// Frame header size: 4 bytes length
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

/// Prefix a payload with its length
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(ElevatorError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(payload);
    Ok(frame.to_vec())
}

/// Read one frame's payload from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes(header);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(ElevatorError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut payload = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write one frame to a stream (not flushed)
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    writer.write_all(&encode_frame(payload)?)?;
    Ok(())
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request payload
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    Ok(bincode::serialize(&WireRequest::from(request))?)
}

/// Decode and validate a request payload
///
/// Undecodable frames and frames missing `cmd`/`args` both fail with a
/// request error.
pub fn decode_request(payload: &[u8]) -> Result<Request> {
    let wire: WireRequest = bincode::deserialize(payload)
        .map_err(|e| ElevatorError::Request(format!("undecodable frame: {}", e)))?;
    Request::try_from(wire)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response into (header payload, content payload)
///
/// With `compress`, the content payload is LZ4-compressed and the header
/// says so.
pub fn encode_response(response: &Response, compress: bool) -> Result<(Vec<u8>, Vec<u8>)> {
    let header = ResponseHeader {
        compression: compress,
        ..response.header.clone()
    };

    let content = bincode::serialize(&response.content)?;
    let content = if compress {
        lz4_flex::compress_prepend_size(&content)
    } else {
        content
    };

    Ok((bincode::serialize(&header)?, content))
}

/// Decode a response from its two payloads
pub fn decode_response(header: &[u8], content: &[u8]) -> Result<Response> {
    let header: ResponseHeader = bincode::deserialize(header)
        .map_err(|e| ElevatorError::Protocol(format!("bad response header: {}", e)))?;

    let content = if header.compression {
        lz4_flex::decompress_size_prepended(content)
            .map_err(|e| ElevatorError::Protocol(format!("bad compressed content: {}", e)))?
    } else {
        content.to_vec()
    };
    let content: ResponseContent = bincode::deserialize(&content)
        .map_err(|e| ElevatorError::Protocol(format!("bad response content: {}", e)))?;

    Ok(Response { header, content })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, &encode_request(request)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    decode_request(&read_frame(reader)?)
}

/// Encode a response as its two length-prefixed frames, back to back
pub fn encode_response_frames(response: &Response, compress: bool) -> Result<Vec<u8>> {
    let (header, content) = encode_response(response, compress)?;
    let mut frames = encode_frame(&header)?;
    frames.extend_from_slice(&encode_frame(&content)?);
    Ok(frames)
}

/// Write a response (both frames) to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response, compress: bool) -> Result<()> {
    writer.write_all(&encode_response_frames(response, compress)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response (both frames) from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let header = read_frame(reader)?;
    let content = read_frame(reader)?;
    decode_response(&header, &content)
}
