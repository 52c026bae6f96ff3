//! Engine Module
//!
//! The storage engine behind one mounted database.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Handle concurrent read/write access
//! - Apply write batches atomically
//! - Hand out consistent snapshots for range reads
//! - Trigger flushes when MemTable is full, compaction when too many tables
//! - Manage crash recovery on startup and offline repair

mod options;
mod snapshot;

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::WalSyncStrategy;
use crate::error::{ElevatorError, Result};
use crate::memtable::MemTable;
use crate::storage::StorageManager;
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

pub use options::EngineOptions;
pub use snapshot::{Snapshot, SnapshotIter};

/// Outcome of an offline repair
#[derive(Debug, Clone, Default)]
pub struct RepairReport {
    /// WAL state found before repair
    pub wal: RecoveryResult,
    /// SSTables renamed to `*.corrupt`
    pub quarantined_sstables: usize,
}

/// The storage engine for one database directory
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/batch/flush): Serialized by `write_lock`
///   - Must acquire: write_lock → WAL → memtable → storage (write)
///
/// - **Reads** (get/exists): no write_lock
///   - MemTable uses an internal RwLock
///   - SSTable readers lock their own file handle per lookup
///
/// - **Snapshots**: taken under `write_lock`, so the memtable map and table
///   list they capture always belong to the same instant.
pub struct Engine {
    path: PathBuf,
    options: EngineOptions,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Serializes write operations and snapshot capture
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create an engine in `path`
    ///
    /// On startup:
    /// 1. Honor create_if_missing / error_if_exists
    /// 2. Load existing SSTables
    /// 3. Recover from WAL if it exists, flush what was recovered
    /// 4. Ready to serve requests
    pub fn open(path: &Path, options: &EngineOptions, sync: WalSyncStrategy) -> Result<Self> {
        let wal_path = path.join(Self::WAL_FILENAME);
        let exists = wal_path.exists();

        if exists && options.error_if_exists {
            return Err(ElevatorError::Database(format!(
                "{} already exists",
                path.display()
            )));
        }
        if !exists && !options.create_if_missing {
            return Err(ElevatorError::Database(format!(
                "{} does not exist (create_if_missing is false)",
                path.display()
            )));
        }

        fs::create_dir_all(path)?;
        let storage = StorageManager::open_with(&path.join(Self::SSTABLE_DIR), options)?;
        let memtable = MemTable::new();

        if exists {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_corrupted > 0 && options.paranoid_checks {
                return Err(ElevatorError::WalCorruption(format!(
                    "{} corrupted entries in {}",
                    recovery.entries_corrupted,
                    wal_path.display()
                )));
            }
            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    path = %path.display(),
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    "WAL recovery"
                );
            }

            for entry in entries {
                memtable.apply(entry.operation);
            }

            // Recovered data becomes durable in an SSTable before the WAL is reset
            if !memtable.is_empty() {
                storage.flush(&memtable.snapshot())?;
                memtable.clear();
            }
        }

        let mut wal = WalWriter::open(&wal_path, sync)?;
        if exists {
            wal.truncate()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            options: options.clone(),
            wal: Mutex::new(wal),
            memtable,
            storage,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with default options (convenience method)
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(path, &EngineOptions::default(), WalSyncStrategy::EveryWrite)
    }

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(entry.into_value());
        }
        self.storage.get(key)
    }

    /// Check whether a key holds a live value, without reading it
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        if let Some(live) = self.memtable.probe(key) {
            return Ok(live);
        }
        Ok(StorageManager::probe(&self.storage.tables(), key)?.unwrap_or(false))
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Delete a key (absent keys are not an error)
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.write(Operation::Delete { key: key.to_vec() })
    }

    /// Apply several puts/deletes atomically
    ///
    /// The batch is a single WAL record and is applied to the memtable under
    /// one lock, so neither recovery nor concurrent readers can observe part
    /// of it.
    pub fn write_batch(&self, ops: Vec<Operation>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        self.write(Operation::Batch { ops })
    }

    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Check if flush needed
    ///
    /// The write is committed once it is in the WAL and the memtable. A
    /// failed flush after that is logged and retried on the next write.
    fn write(&self, operation: Operation) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(operation.clone())?;
        let new_size = self.memtable.apply(operation);

        if new_size >= self.options.write_buffer_size {
            if let Err(e) = self.flush_internal() {
                tracing::warn!(path = %self.path.display(), error = %e, "Deferred memtable flush failed");
            }
        }
        Ok(())
    }

    /// Capture a consistent point-in-time view
    pub fn snapshot(&self) -> Snapshot {
        let _write_guard = self.write_lock.lock();
        Snapshot::new(self.memtable.snapshot(), self.storage.tables())
    }

    /// Flush memtable to disk (public API)
    ///
    /// Forces a flush regardless of memtable size
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_internal()
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_internal(&self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        // New table goes live before the memtable is cleared, so readers
        // always find the data in one place or the other
        self.storage.flush(&self.memtable.snapshot())?;
        self.memtable.clear();
        self.wal.lock().truncate()?;

        if self.storage.sstable_count() > self.options.max_open_files.max(1) {
            self.storage.compact()?;
        }
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;
        tracing::debug!(path = %self.path.display(), "Engine closed");
        Ok(())
    }

    /// Repair an unmounted database directory
    ///
    /// Quarantines SSTables that fail verification, drops WAL records that
    /// fail their checksum and truncates a torn WAL tail, then re-opens and
    /// flushes so the directory is clean.
    pub fn repair(path: &Path, options: &EngineOptions, sync: WalSyncStrategy) -> Result<RepairReport> {
        if !path.exists() {
            return Err(ElevatorError::Database(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let quarantined_sstables =
            StorageManager::quarantine_corrupt(&path.join(Self::SSTABLE_DIR))?;

        let wal_path = path.join(Self::WAL_FILENAME);
        let wal = if wal_path.exists() {
            WalRecovery::verify(&wal_path)?
        } else {
            RecoveryResult::default()
        };

        let lenient = EngineOptions {
            create_if_missing: true,
            error_if_exists: false,
            paranoid_checks: false,
            ..options.clone()
        };
        Self::open(path, &lenient, sync)?.close()?;

        tracing::info!(
            path = %path.display(),
            quarantined_sstables,
            wal_corrupted = wal.entries_corrupted,
            "Repaired database"
        );
        Ok(RepairReport {
            wal,
            quarantined_sstables,
        })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the database directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the options this engine was opened with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Number of SSTable lookups currently cached
    pub fn cached_lookups(&self) -> usize {
        self.storage.cache().len()
    }
}
