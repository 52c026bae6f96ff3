//! Snapshots
//!
//! A consistent, unchanging view of an engine as of the moment it was taken.
//! Holding a snapshot pins the memtable map and the SSTable readers it saw;
//! later writes, flushes and compactions are invisible to it.

use std::ops::Bound;
use std::sync::Arc;

use crate::error::Result;
use crate::memtable::{MemTableCursor, MemTableSnapshot};
use crate::storage::{EntrySource, MergeIterator, SSTableCursor, SSTableReader, StorageManager};

/// Point-in-time view of one engine
pub struct Snapshot {
    memtable: MemTableSnapshot,
    /// Newest first
    tables: Vec<Arc<SSTableReader>>,
}

impl Snapshot {
    pub(crate) fn new(memtable: MemTableSnapshot, tables: Vec<Arc<SSTableReader>>) -> Self {
        Self { memtable, tables }
    }

    /// Get a value as of the snapshot
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(entry.clone().into_value());
        }
        StorageManager::lookup(&self.tables, key, None)
    }

    /// Live entries with key >= `start`, ascending
    pub fn iter_from(&self, start: &[u8]) -> SnapshotIter {
        self.iter_bound(Bound::Included(start.to_vec()))
    }

    /// Every live entry, ascending
    pub fn iter(&self) -> SnapshotIter {
        self.iter_bound(Bound::Unbounded)
    }

    /// Live entries with `from <= key <= to`, ascending
    pub fn range(&self, from: &[u8], to: &[u8]) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> {
        let to = to.to_vec();
        self.iter_from(from).take_while(move |entry| match entry {
            Ok((key, _)) => *key <= to,
            Err(_) => true,
        })
    }

    fn iter_bound(&self, start: Bound<Vec<u8>>) -> SnapshotIter {
        let mut sources: Vec<EntrySource> = Vec::with_capacity(self.tables.len() + 1);

        let memtable = MemTableCursor::new(Arc::clone(&self.memtable), start.clone());
        sources.push(Box::new(memtable.map(|(k, e)| Ok((k, e.into_value())))));

        for reader in &self.tables {
            sources.push(Box::new(SSTableCursor::new(Arc::clone(reader), start.clone())));
        }

        SnapshotIter {
            inner: MergeIterator::new(sources),
        }
    }
}

/// Ascending iterator over a snapshot's live entries
pub struct SnapshotIter {
    inner: MergeIterator,
}

impl Iterator for SnapshotIter {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        // MergeIterator hides tombstones, so every value is present
        self.inner
            .next()
            .map(|entry| entry.map(|(k, v)| (k, v.unwrap_or_default())))
    }
}
