//! Error types for Elevator
//!
//! Provides a unified error type for all operations, and the mapping from
//! that type onto the wire error codes clients see.

use thiserror::Error;

use crate::protocol::ErrorCode;

/// Result type alias using ElevatorError
pub type Result<T> = std::result::Result<T, ElevatorError>;

/// Unified error type for Elevator operations
#[derive(Debug, Error)]
pub enum ElevatorError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Malformed request: {0}")]
    Request(String),

    // -------------------------------------------------------------------------
    // Database Registry Errors
    // -------------------------------------------------------------------------
    #[error("Database error: {0}")]
    Database(String),

    // -------------------------------------------------------------------------
    // Command Argument Errors
    // -------------------------------------------------------------------------
    #[error("Type error: {0}")]
    Type(String),

    #[error("Value error: {0}")]
    Value(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Unknown batch signal: {0}")]
    Signal(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Database {0} not found")]
    UnknownDatabase(String),

    #[error("{0}")]
    Runtime(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ElevatorError {
    /// Wire error code reported to clients for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ElevatorError::Io(_) => ErrorCode::OsError,
            ElevatorError::WalCorruption(_)
            | ElevatorError::WalWrite(_)
            | ElevatorError::Storage(_)
            | ElevatorError::Serialization(_)
            | ElevatorError::Runtime(_)
            | ElevatorError::UnknownDatabase(_)
            | ElevatorError::Config(_) => ErrorCode::RuntimeError,
            ElevatorError::KeyNotFound | ElevatorError::UnknownCommand(_) => ErrorCode::KeyError,
            ElevatorError::Protocol(_) | ElevatorError::Request(_) => ErrorCode::RequestError,
            ElevatorError::Database(_) => ErrorCode::DatabaseError,
            ElevatorError::Type(_) => ErrorCode::TypeError,
            ElevatorError::Value(_) => ErrorCode::ValueError,
            ElevatorError::Index(_) => ErrorCode::IndexError,
            ElevatorError::Signal(_) => ErrorCode::SignalError,
        }
    }
}

impl From<bincode::Error> for ElevatorError {
    fn from(e: bincode::Error) -> Self {
        ElevatorError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for ElevatorError {
    fn from(e: serde_json::Error) -> Self {
        ElevatorError::Serialization(e.to_string())
    }
}
