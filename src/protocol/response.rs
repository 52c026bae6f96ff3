//! Response definitions
//!
//! A response is always a header frame plus a content frame. The status in
//! the header says how to read the content.

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::ElevatorError;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Status {
    /// Command succeeded; content holds its result
    Success = 1,
    /// Command failed; the header carries the error
    Failure = -1,
    /// Partial success (e.g. MGET with missing keys); check each element
    Warning = -2,
}

impl From<Status> for i8 {
    fn from(status: Status) -> i8 {
        status as i8
    }
}

impl TryFrom<i8> for Status {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Status::Success),
            -1 => Ok(Status::Failure),
            -2 => Ok(Status::Warning),
            other => Err(format!("unknown status code {}", other)),
        }
    }
}

/// Error classes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ErrorCode {
    TypeError = 0,
    KeyError = 1,
    ValueError = 2,
    IndexError = 3,
    RuntimeError = 4,
    OsError = 5,
    DatabaseError = 6,
    SignalError = 7,
    RequestError = 8,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => ErrorCode::TypeError,
            1 => ErrorCode::KeyError,
            2 => ErrorCode::ValueError,
            3 => ErrorCode::IndexError,
            4 => ErrorCode::RuntimeError,
            5 => ErrorCode::OsError,
            6 => ErrorCode::DatabaseError,
            7 => ErrorCode::SignalError,
            8 => ErrorCode::RequestError,
            other => return Err(format!("unknown error code {}", other)),
        })
    }
}

/// Header frame; never compressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub status: Status,
    pub err_code: Option<ErrorCode>,
    pub err_msg: Option<String>,
    /// Whether the content frame is LZ4-compressed
    pub compression: bool,
}

/// Content frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseContent {
    pub datas: Option<Vec<Value>>,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub header: ResponseHeader,
    pub content: ResponseContent,
}

impl Response {
    /// Create a SUCCESS response
    pub fn success(datas: Vec<Value>) -> Self {
        Self::with_status(Status::Success, datas)
    }

    /// Create a WARNING response; callers must inspect each element
    pub fn warning(datas: Vec<Value>) -> Self {
        Self::with_status(Status::Warning, datas)
    }

    /// Create a FAILURE response
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            header: ResponseHeader {
                status: Status::Failure,
                err_code: Some(code),
                err_msg: Some(message.into()),
                compression: false,
            },
            content: ResponseContent { datas: None },
        }
    }

    fn with_status(status: Status, datas: Vec<Value>) -> Self {
        Self {
            header: ResponseHeader {
                status,
                err_code: None,
                err_msg: None,
                compression: false,
            },
            content: ResponseContent { datas: Some(datas) },
        }
    }

    pub fn status(&self) -> Status {
        self.header.status
    }

    /// Result values (empty for failures)
    pub fn datas(&self) -> &[Value] {
        self.content.datas.as_deref().unwrap_or(&[])
    }

    /// Error code for failures
    pub fn err_code(&self) -> Option<ErrorCode> {
        self.header.err_code
    }
}

impl From<ElevatorError> for Response {
    fn from(e: ElevatorError) -> Self {
        Response::failure(e.code(), e.to_string())
    }
}
