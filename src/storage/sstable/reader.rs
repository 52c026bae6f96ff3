//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{ElevatorError, Result};

use super::iterator::SSTableIterator;
use super::{le_u32, le_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
///
/// The file handle sits behind a mutex so lookups only need `&self`, which
/// lets many threads and snapshots share one reader.
pub struct SSTableReader {
    id: u64,
    path: PathBuf,
    file: Mutex<BufReader<File>>,
    /// In-memory index: key → file offset
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
    /// Index block starting offset (end of data block)
    index_offset: u64,
    data_crc: u32,
}

impl SSTableReader {
    /// Open an SSTable for reading with the default buffer size
    pub fn open(path: &Path, id: u64) -> Result<Self> {
        Self::open_with(path, id, 8 * 1024, false)
    }

    /// Open an SSTable, optionally verifying the data checksum
    ///
    /// Loads the entire index into memory for fast lookups.
    pub fn open_with(path: &Path, id: u64, block_size: usize, paranoid: bool) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(ElevatorError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(ElevatorError::Storage(format!(
                "Invalid SSTable magic: expected ELVT, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(ElevatorError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = le_u64(&header[6..14]);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = le_u64(&footer[0..8]);
        let data_crc = le_u32(&footer[8..12]);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(ElevatorError::Storage(format!(
                "SSTable {} has invalid index offset {}",
                path.display(),
                index_offset
            )));
        }

        let mut index = BTreeMap::new();
        file.seek(SeekFrom::Start(index_offset))?;

        let index_block_size = file_size - FOOTER_SIZE - index_offset;
        let mut index_data = vec![0u8; index_block_size as usize];
        file.read_exact(&mut index_data)?;

        // [key_len(4)][offset(8)][key]
        let mut pos = 0;
        while pos + 12 <= index_data.len() {
            let key_len = le_u32(&index_data[pos..]) as usize;
            let offset = le_u64(&index_data[pos + 4..]);
            pos += 12;

            if pos + key_len > index_data.len() {
                break;
            }
            index.insert(index_data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }

        if index.len() as u64 != entry_count {
            return Err(ElevatorError::Storage(format!(
                "SSTable {} index holds {} keys, header says {}",
                path.display(),
                index.len(),
                entry_count
            )));
        }

        let reader = Self {
            id,
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::with_capacity(block_size.max(512), file)),
            index,
            entry_count,
            index_offset,
            data_crc,
        };

        if paranoid && !reader.verify()? {
            return Err(ElevatorError::Storage(format!(
                "SSTable {} failed checksum verification",
                path.display()
            )));
        }

        Ok(reader)
    }

    /// Get a value by key — O(log n) lookup via in-memory index
    ///
    /// Returns:
    /// - `Ok(Some(Some(value)))` — key found with value
    /// - `Ok(Some(None))` — key found but is a tombstone (deleted)
    /// - `Ok(None)` — key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<Option<Vec<u8>>>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };
        let (_, value) = self.read_entry_at(offset)?;
        Ok(Some(value))
    }

    /// Presence probe that reads only the entry header, never the value
    ///
    /// `Some(true)` for a live entry, `Some(false)` for a tombstone, `None`
    /// when this table does not know the key.
    pub fn probe(&self, key: &[u8]) -> Result<Option<bool>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        Ok(Some(le_u32(&header[4..8]) != TOMBSTONE_MARKER))
    }

    /// Read the entry stored at `offset`
    pub(super) fn read_entry_at(&self, offset: u64) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let key_len = le_u32(&header[0..4]) as usize;
        let val_len = le_u32(&header[4..8]);

        let mut key = vec![0u8; key_len];
        file.read_exact(&mut key)?;

        if val_len == TOMBSTONE_MARKER {
            return Ok((key, None));
        }

        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;
        Ok((key, Some(value)))
    }

    /// First indexed key within `(lower, Unbounded)` and its offset
    pub(super) fn next_indexed(&self, lower: Bound<&[u8]>) -> Option<(Vec<u8>, u64)> {
        self.index
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, &off)| (k.clone(), off))
    }

    /// Recompute the data block checksum and compare it with the footer
    pub fn verify(&self) -> Result<bool> {
        let mut file = self.file.lock();
        let mut hasher = crc32fast::Hasher::new();
        let mut count = 0u64;

        for entry in SSTableIterator::new(&mut *file, self.index_offset)? {
            let (key, value) = entry?;
            hasher.update(&(key.len() as u32).to_le_bytes());
            match &value {
                Some(v) => hasher.update(&(v.len() as u32).to_le_bytes()),
                None => hasher.update(&TOMBSTONE_MARKER.to_le_bytes()),
            }
            hasher.update(&key);
            if let Some(v) = &value {
                hasher.update(v);
            }
            count += 1;
        }

        Ok(count == self.entry_count && hasher.finalize() == self.data_crc)
    }

    /// Table id (higher is newer)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// File path of this table
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Get the minimum key in this SSTable (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Get the maximum key in this SSTable (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false,
        }
    }
}
