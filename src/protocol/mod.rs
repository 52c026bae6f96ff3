//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Request
//! ```text
//! { meta: map (optional), uid: string|null, cmd: string, args: list }
//! ```
//!
//! ## Response (two frames)
//! ```text
//! header:  { status: 1|-1|-2, err_code, err_msg, compression }
//! content: { datas: list|null }
//! ```
//!
//! ### Status Codes
//! - 1:  SUCCESS
//! - -1: FAILURE
//! - -2: WARNING (partial success)
//!
//! ### Error Codes
//! TypeError=0, KeyError=1, ValueError=2, IndexError=3, RuntimeError=4,
//! OSError=5, DatabaseError=6, SignalError=7, RequestError=8

mod value;
mod request;
mod response;
mod codec;

pub use value::Value;
pub use request::{Request, WireRequest, META_AUTH, META_COMPRESSION};
pub use response::{ErrorCode, Response, ResponseContent, ResponseHeader, Status};
pub use codec::{
    decode_request, decode_response, encode_frame, encode_request, encode_response,
    encode_response_frames,
    read_frame, read_request, read_response, write_frame, write_request, write_response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
