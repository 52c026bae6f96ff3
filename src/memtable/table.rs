//! MemTable implementation
//!
//! Copy-on-write BTreeMap with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::wal::Operation;

use super::MemTableEntry;

/// Immutable point-in-time view of the memtable contents
pub type MemTableSnapshot = Arc<BTreeMap<Vec<u8>, MemTableEntry>>;

/// Per-entry bookkeeping overhead counted towards the size limit
const ENTRY_OVERHEAD: usize = 16;

/// In-memory table for recent writes
pub struct MemTable {
    data: RwLock<MemTableSnapshot>,
    /// Approximate size in bytes (keys + values + overhead)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Arc::new(BTreeMap::new())),
            size: AtomicUsize::new(0),
        }
    }

    /// Get an entry by key (read lock)
    ///
    /// `Some(Tombstone)` means the key was deleted here and older data must
    /// not be consulted.
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Presence probe that never clones the value
    ///
    /// `Some(true)` live, `Some(false)` tombstone, `None` unknown here.
    pub fn probe(&self, key: &[u8]) -> Option<bool> {
        self.data
            .read()
            .get(key)
            .map(|entry| matches!(entry, MemTableEntry::Value(_)))
    }

    /// Put a key-value pair, returning the new approximate size
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(Arc::make_mut(&mut data), key, MemTableEntry::Value(value))
    }

    /// Delete a key (inserts tombstone), returning the new approximate size
    pub fn delete(&self, key: Vec<u8>) -> usize {
        let mut data = self.data.write();
        self.insert(Arc::make_mut(&mut data), key, MemTableEntry::Tombstone)
    }

    /// Apply an operation under a single write lock, so readers observe
    /// either none or all of a batch
    pub fn apply(&self, operation: Operation) -> usize {
        let mut data = self.data.write();
        let map = Arc::make_mut(&mut data);
        self.apply_locked(map, operation);
        self.size()
    }

    fn apply_locked(&self, map: &mut BTreeMap<Vec<u8>, MemTableEntry>, operation: Operation) {
        match operation {
            Operation::Put { key, value } => {
                self.insert(map, key, MemTableEntry::Value(value));
            }
            Operation::Delete { key } => {
                self.insert(map, key, MemTableEntry::Tombstone);
            }
            Operation::Batch { ops } => {
                for op in ops {
                    self.apply_locked(map, op);
                }
            }
        }
    }

    fn insert(
        &self,
        map: &mut BTreeMap<Vec<u8>, MemTableEntry>,
        key: Vec<u8>,
        entry: MemTableEntry,
    ) -> usize {
        let key_len = key.len();
        let new_len = entry_len(&entry);
        match map.insert(key, entry) {
            Some(old) => {
                let old_len = entry_len(&old);
                if new_len >= old_len {
                    self.size.fetch_add(new_len - old_len, Ordering::Relaxed);
                } else {
                    self.size.fetch_sub(old_len - new_len, Ordering::Relaxed);
                }
            }
            None => {
                self.size
                    .fetch_add(key_len + new_len + ENTRY_OVERHEAD, Ordering::Relaxed);
            }
        }
        self.size()
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the memtable holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Check if should flush (size >= limit)
    pub fn should_flush(&self, size_limit: usize) -> bool {
        self.size() >= size_limit
    }

    /// Take an O(1) point-in-time snapshot
    pub fn snapshot(&self) -> MemTableSnapshot {
        Arc::clone(&self.data.read())
    }

    /// Get an iterator over all entries (for flush)
    /// Returns entries in sorted key order
    pub fn iter(&self) -> MemTableCursor {
        MemTableCursor::new(self.snapshot(), Bound::Unbounded)
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        *self.data.write() = Arc::new(BTreeMap::new());
        self.size.store(0, Ordering::Relaxed);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_len(entry: &MemTableEntry) -> usize {
    match entry {
        MemTableEntry::Value(v) => v.len(),
        MemTableEntry::Tombstone => 0,
    }
}

/// Owned cursor over a memtable snapshot, in ascending key order
pub struct MemTableCursor {
    map: MemTableSnapshot,
    next: Bound<Vec<u8>>,
}

impl MemTableCursor {
    /// Start iterating at `start`
    pub fn new(map: MemTableSnapshot, start: Bound<Vec<u8>>) -> Self {
        Self { map, next: start }
    }
}

impl Iterator for MemTableCursor {
    /// (key, entry) in ascending key order
    type Item = (Vec<u8>, MemTableEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let lower = std::mem::replace(&mut self.next, Bound::Unbounded);
        let (key, entry) = self
            .map
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(k, e)| (k.clone(), e.clone()))?;
        self.next = Bound::Excluded(key.clone());
        Some((key, entry))
    }
}
