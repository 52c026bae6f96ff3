//! Engine options
//!
//! Per-database tuning knobs. These are persisted verbatim in the registry
//! file, so field names are part of the on-disk format.

use serde::{Deserialize, Serialize};

/// Options a database is created (and later re-opened) with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Create the database files when the directory holds none
    pub create_if_missing: bool,

    /// Refuse to open a directory that already holds a database
    pub error_if_exists: bool,

    /// Fail on any checksum mismatch instead of skipping the damaged record
    pub paranoid_checks: bool,

    /// Byte budget for the SSTable lookup cache
    pub block_cache_size: usize,

    /// MemTable size (bytes) that triggers a flush to an SSTable
    pub write_buffer_size: usize,

    /// Buffer size used for SSTable file I/O
    pub block_size: usize,

    /// SSTable count above which all tables are compacted into one
    pub max_open_files: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            block_cache_size: 16 * 1024 * 1024, // 16 MB
            write_buffer_size: 4 * 1024 * 1024,  // 4 MB
            block_size: 4096,
            max_open_files: 1000,
        }
    }
}

impl EngineOptions {
    /// Names accepted by `DBCREATE` option maps
    pub const NAMES: [&'static str; 7] = [
        "create_if_missing",
        "error_if_exists",
        "paranoid_checks",
        "block_cache_size",
        "write_buffer_size",
        "block_size",
        "max_open_files",
    ];

    /// Options for re-opening a database this server already created:
    /// `error_if_exists` only applies to creation
    pub fn for_reopen(&self) -> Self {
        Self {
            error_if_exists: false,
            ..self.clone()
        }
    }
}
