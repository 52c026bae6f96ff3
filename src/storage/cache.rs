//! Lookup cache
//!
//! LRU cache of point lookups served from SSTables. Tables are immutable, so
//! an entry keyed by (table id, key) never goes stale; compaction simply
//! produces a new id.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// LRU of SSTable point lookups
pub struct LookupCache {
    entries: Option<Mutex<LruCache<(u64, Vec<u8>), Vec<u8>>>>,
}

impl LookupCache {
    /// Cache sized for `cache_bytes / block_size` entries; zero disables it
    pub fn new(cache_bytes: usize, block_size: usize) -> Self {
        let capacity = cache_bytes / block_size.max(1);
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, table: u64, key: &[u8]) -> Option<Vec<u8>> {
        let entries = self.entries.as_ref()?;
        entries.lock().get(&(table, key.to_vec())).cloned()
    }

    pub fn insert(&self, table: u64, key: &[u8], value: &[u8]) {
        if let Some(entries) = &self.entries {
            entries.lock().put((table, key.to_vec()), value.to_vec());
        }
    }

    /// Number of cached lookups
    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.lock().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
