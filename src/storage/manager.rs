//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Compact all SSTables into one when too many are open
//! - Quarantine SSTables that fail verification (repair)

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::EngineOptions;
use crate::error::{ElevatorError, Result};
use crate::memtable::{MemTableCursor, MemTableEntry, MemTableSnapshot};

use super::cache::LookupCache;
use super::merge::{EntrySource, MergeIterator};
use super::{SSTable, SSTableBuilder, SSTableCursor, SSTableReader};

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - readers are shared as `Arc`s so snapshots outlive list changes
/// - `next_sstable_id`: Atomic counter (lock-free)
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<Arc<SSTableReader>>>,

    /// Next ID for creating new SSTables
    next_sstable_id: AtomicU64,

    cache: LookupCache,
    block_size: usize,
}

impl StorageManager {
    /// Open or create storage in the given directory with default options
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &EngineOptions::default())
    }

    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing SSTable files
    /// 3. Open readers for each (loads indexes into RAM, verifies if paranoid)
    /// 4. Order by ID descending (newest first)
    pub fn open_with(path: &Path, options: &EngineOptions) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut sstable_ids = Self::discover(path)?;
        sstable_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut sstables = Vec::with_capacity(sstable_ids.len());
        for id in &sstable_ids {
            let reader = SSTableReader::open_with(
                &Self::sstable_path_with_dir(path, *id),
                *id,
                options.block_size,
                options.paranoid_checks,
            )?;
            sstables.push(Arc::new(reader));
        }

        let next_id = sstable_ids.first().map(|&id| id + 1).unwrap_or(1);

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
            cache: LookupCache::new(options.block_cache_size, options.block_size),
            block_size: options.block_size,
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found with value
    /// - `Ok(None)` — key not found, or found tombstone (deleted)
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tables = self.tables();
        Self::lookup(&tables, key, Some(&self.cache))
    }

    /// Point lookup over an explicit table list (newest first)
    pub(crate) fn lookup(
        tables: &[Arc<SSTableReader>],
        key: &[u8],
        cache: Option<&LookupCache>,
    ) -> Result<Option<Vec<u8>>> {
        for reader in tables {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(value) = cache.and_then(|c| c.get(reader.id(), key)) {
                return Ok(Some(value));
            }
            match reader.get(key)? {
                Some(Some(value)) => {
                    if let Some(c) = cache {
                        c.insert(reader.id(), key, &value);
                    }
                    return Ok(Some(value));
                }
                Some(None) => return Ok(None), // Tombstone = deleted
                None => continue,
            }
        }
        Ok(None)
    }

    /// Whether any table records `key`, without reading values
    ///
    /// Returns `Some(true)` for a live entry, `Some(false)` for a tombstone
    /// and `None` when no table knows the key.
    pub(crate) fn probe(tables: &[Arc<SSTableReader>], key: &[u8]) -> Result<Option<bool>> {
        for reader in tables {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(live) = reader.probe(key)? {
                return Ok(Some(live));
            }
        }
        Ok(None)
    }

    /// Flush a MemTable snapshot to a new SSTable
    ///
    /// Creates a new SSTable file from the snapshot's sorted entries,
    /// opens a reader for it, and adds it to the front of the list.
    pub fn flush(&self, memtable: &MemTableSnapshot) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(ElevatorError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);

        let mut builder = SSTableBuilder::with_block_size(&path, self.block_size)?;
        for (key, entry) in MemTableCursor::new(Arc::clone(memtable), Bound::Unbounded) {
            match entry {
                MemTableEntry::Value(v) => builder.add(&key, &v)?,
                MemTableEntry::Tombstone => builder.add_tombstone(&key)?,
            }
        }
        let metadata = builder.finish()?;

        let reader = SSTableReader::open_with(&path, id, self.block_size, false)?;
        self.sstables.write().insert(0, Arc::new(reader));

        tracing::debug!(id, entries = metadata.entry_count, "Flushed memtable to SSTable");
        Ok(metadata)
    }

    /// Merge every SSTable into one, dropping tombstones and shadowed values
    ///
    /// Callers must serialize this with flushes. Snapshots taken earlier keep
    /// reading the old tables through their `Arc`s.
    pub fn compact(&self) -> Result<()> {
        let old = self.tables();
        if old.len() < 2 {
            return Ok(());
        }

        let sources: Vec<EntrySource> = old
            .iter()
            .map(|r| Box::new(SSTableCursor::new(Arc::clone(r), Bound::Unbounded)) as EntrySource)
            .collect();

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.sstable_path(id);
        let mut builder = SSTableBuilder::with_block_size(&path, self.block_size)?;
        for entry in MergeIterator::new(sources) {
            let (key, value) = entry?;
            if let Some(v) = value {
                builder.add(&key, &v)?;
            }
        }

        let replacement = if builder.entry_count() > 0 {
            builder.finish()?;
            vec![Arc::new(SSTableReader::open_with(&path, id, self.block_size, false)?)]
        } else {
            drop(builder);
            fs::remove_file(&path)?;
            Vec::new()
        };

        *self.sstables.write() = replacement;

        for reader in &old {
            if let Err(e) = fs::remove_file(reader.path()) {
                tracing::warn!(path = %reader.path().display(), error = %e, "Failed to remove compacted SSTable");
            }
        }

        tracing::info!(dir = %self.data_dir.display(), merged = old.len(), "Compacted SSTables");
        Ok(())
    }

    /// Verify every table in `dir`, renaming those that fail to `*.corrupt`
    ///
    /// Returns the number of tables quarantined.
    pub fn quarantine_corrupt(dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut quarantined = 0;
        for id in Self::discover(dir)? {
            let path = Self::sstable_path_with_dir(dir, id);
            let healthy = match SSTableReader::open(&path, id) {
                Ok(reader) => reader.verify().unwrap_or(false),
                Err(_) => false,
            };
            if !healthy {
                let target = path.with_extension("corrupt");
                fs::rename(&path, &target)?;
                tracing::warn!(path = %path.display(), "Quarantined corrupt SSTable");
                quarantined += 1;
            }
        }
        Ok(quarantined)
    }

    /// Current table list, newest first
    pub fn tables(&self) -> Vec<Arc<SSTableReader>> {
        self.sstables.read().clone()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    /// Lookup cache in front of the tables
    pub(crate) fn cache(&self) -> &LookupCache {
        &self.cache
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn discover(dir: &Path) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let file_path = entry?.path();
            if file_path.is_file() {
                if let Some(id) = Self::parse_sstable_id(&file_path) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    fn sstable_path(&self, id: u64) -> PathBuf {
        Self::sstable_path_with_dir(&self.data_dir, id)
    }

    fn sstable_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("sstable_{:06}.sst", id))
    }

    /// Parse SSTable ID from filename
    /// "sstable_000042.sst" → Some(42)
    fn parse_sstable_id(path: &Path) -> Option<u64> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("sstable_")?;
        id_str.parse().ok()
    }
}
