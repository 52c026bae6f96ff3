//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ElevatorError, Result};

use super::entry::{parse_header, HEADER_SIZE};
use super::WalEntry;

/// Upper bound on a single record payload; anything larger is a torn header
const MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;

/// Outcome of reading one framed record
#[derive(Debug)]
pub(crate) enum Record {
    /// A valid entry
    Entry(WalEntry),
    /// A complete record whose checksum or payload is bad; skipped
    Corrupted { reason: String },
    /// The file ends partway through a record starting at `offset`
    Truncated { offset: u64 },
    /// Clean end of file
    End,
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Byte offset of the next record
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Byte offset just past the last record read
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at end of file. A corrupted or truncated record is
    /// reported as `WalCorruption`; reading can continue past a corrupted
    /// record but not past a truncated one.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_record()? {
            Record::Entry(entry) => Ok(Some(entry)),
            Record::End => Ok(None),
            Record::Corrupted { reason } => Err(ElevatorError::WalCorruption(reason)),
            Record::Truncated { offset } => Err(ElevatorError::WalCorruption(format!(
                "partial record at offset {}",
                offset
            ))),
        }
    }

    /// Iterate over all entries, stopping after the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    pub(crate) fn next_record(&mut self) -> Result<Record> {
        let start = self.position;

        let mut header = [0u8; HEADER_SIZE];
        let read = read_fully(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(Record::End);
        }
        if read < HEADER_SIZE {
            return Ok(Record::Truncated { offset: start });
        }

        let (lsn, crc, len) = parse_header(&header);
        if len > MAX_RECORD_SIZE {
            return Ok(Record::Truncated { offset: start });
        }

        let mut payload = vec![0u8; len];
        if read_fully(&mut self.reader, &mut payload)? < len {
            return Ok(Record::Truncated { offset: start });
        }

        self.position = start + (HEADER_SIZE + len) as u64;

        match WalEntry::from_payload(lsn, crc, &payload) {
            Ok(entry) => Ok(Record::Entry(entry)),
            Err(e) => Ok(Record::Corrupted {
                reason: e.to_string(),
            }),
        }
    }
}

/// Fill `buf` as far as the file allows, returning the byte count
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
