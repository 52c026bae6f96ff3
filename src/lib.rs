//! # Elevator
//!
//! A multi-database key-value server with:
//! - Named databases, created, mounted and dropped at runtime
//! - A worker pool fed by a shared request queue, managed over a separate
//!   control plane
//! - Atomic write batches and snapshot range scans
//! - Write-Ahead Logging (WAL) and crash recovery per database
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (reader + writer thread per client)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ request frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Broker (data queue)                          │
//! │   Supervisor ──control──▶ Worker × N ──▶ Handler             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              Database Registry  ◀── Majordome (reaper)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one engine per mounted database
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod protocol;
pub mod database;
pub mod handler;
pub mod broker;
pub mod majordome;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ElevatorError, Result};
pub use config::Config;
pub use engine::Engine;
pub use database::DatabaseStore;
pub use handler::Handler;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Elevator
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
