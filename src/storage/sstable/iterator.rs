//! SSTable Iterators
//!
//! Sequential iteration over the data block, and owned cursors that walk the
//! index from an arbitrary start key for range scans.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::sync::Arc;

use crate::error::Result;

use super::{le_u32, SSTableReader, HEADER_SIZE, TOMBSTONE_MARKER};

/// Iterator over SSTable entries in file order (sorted key order)
pub struct SSTableIterator<'a> {
    file: &'a mut BufReader<File>,
    /// Stop reading when we reach this offset (start of index block)
    end_offset: u64,
    current_offset: u64,
}

impl<'a> SSTableIterator<'a> {
    /// Create a new iterator starting from the data block
    pub(super) fn new(file: &'a mut BufReader<File>, end_offset: u64) -> Result<Self> {
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        Ok(Self {
            file,
            end_offset,
            current_offset: HEADER_SIZE,
        })
    }

    fn read_next(&mut self) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;
        let key_len = le_u32(&header[0..4]) as usize;
        let val_len = le_u32(&header[4..8]);

        let mut key = vec![0u8; key_len];
        self.file.read_exact(&mut key)?;
        let mut entry_size = 8 + key_len as u64;

        let value = if val_len == TOMBSTONE_MARKER {
            None
        } else {
            let mut v = vec![0u8; val_len as usize];
            self.file.read_exact(&mut v)?;
            entry_size += val_len as u64;
            Some(v)
        };

        self.current_offset += entry_size;
        Ok((key, value))
    }
}

impl<'a> Iterator for SSTableIterator<'a> {
    /// (key, Option<value>) — None value means tombstone
    type Item = Result<(Vec<u8>, Option<Vec<u8>>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset >= self.end_offset {
            return None;
        }
        match self.read_next() {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                // Stop after the first failure
                self.current_offset = self.end_offset;
                Some(Err(e))
            }
        }
    }
}

/// Owned cursor over one SSTable starting at an arbitrary key
///
/// Holds an `Arc` to the reader, so the table stays readable for as long as
/// a snapshot references it, even after compaction replaces it.
pub struct SSTableCursor {
    reader: Arc<SSTableReader>,
    next: Bound<Vec<u8>>,
    failed: bool,
}

impl SSTableCursor {
    pub fn new(reader: Arc<SSTableReader>, start: Bound<Vec<u8>>) -> Self {
        Self {
            reader,
            next: start,
            failed: false,
        }
    }
}

impl Iterator for SSTableCursor {
    type Item = Result<(Vec<u8>, Option<Vec<u8>>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let lower = match &self.next {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let (key, offset) = self.reader.next_indexed(lower)?;
        self.next = Bound::Excluded(key);

        match self.reader.read_entry_at(offset) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
