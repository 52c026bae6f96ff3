//! Storage Module
//!
//! Persistent storage layer using SSTable-like format.
//!
//! ## Responsibilities
//! - Persist data to disk in sorted format
//! - Efficient range scans and point lookups
//! - Full compaction once too many tables are open
//! - LRU cache for point lookups
//!
//! ## Layout
//! ```text
//!   {db}/sstables/
//!     ├── sstable_000001.sst   (oldest)
//!     ├── sstable_000002.sst
//!     └── sstable_000003.sst   (newest, wins on lookup)
//! ```
//!
//! The on-disk table format is documented in `sstable/mod.rs`.

mod sstable;
mod manager;
mod merge;
mod cache;

pub use sstable::{SSTable, SSTableBuilder, SSTableCursor, SSTableIterator, SSTableReader};
pub use manager::StorageManager;
pub use merge::{EntrySource, MergeIterator};
pub use cache::LookupCache;
