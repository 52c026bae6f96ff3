//! Merge iterator
//!
//! Combines several sorted sources (memtable and SSTables) into a single
//! ascending stream. Sources are given newest first; when several sources
//! hold the same key the newest one wins.

use crate::error::Result;

/// A sorted source of `(key, value)` pairs where a `None` value is a tombstone
pub type EntrySource = Box<dyn Iterator<Item = Result<(Vec<u8>, Option<Vec<u8>>)>> + Send>;

type Head = Option<(Vec<u8>, Option<Vec<u8>>)>;

/// K-way merge over sorted sources, newest first
pub struct MergeIterator {
    sources: Vec<EntrySource>,
    heads: Vec<Head>,
    primed: bool,
    failed: bool,
    keep_tombstones: bool,
}

impl MergeIterator {
    /// Merge `sources` (newest first), hiding deleted keys
    pub fn new(sources: Vec<EntrySource>) -> Self {
        let heads = sources.iter().map(|_| None).collect();
        Self {
            sources,
            heads,
            primed: false,
            failed: false,
            keep_tombstones: false,
        }
    }

    /// Also yield tombstones (as `None` values)
    pub fn with_tombstones(mut self) -> Self {
        self.keep_tombstones = true;
        self
    }

    fn pull(&mut self, idx: usize) -> Result<()> {
        self.heads[idx] = match self.sources[idx].next() {
            Some(entry) => Some(entry?),
            None => None,
        };
        Ok(())
    }

    fn step(&mut self) -> Result<Option<(Vec<u8>, Option<Vec<u8>>)>> {
        if !self.primed {
            for idx in 0..self.sources.len() {
                self.pull(idx)?;
            }
            self.primed = true;
        }

        loop {
            // Strict comparison keeps the lowest (newest) index on ties
            let mut winner: Option<usize> = None;
            for (idx, head) in self.heads.iter().enumerate() {
                if let Some((key, _)) = head {
                    let better = match winner.and_then(|w| self.heads[w].as_ref()) {
                        Some((best, _)) => key < best,
                        None => true,
                    };
                    if better {
                        winner = Some(idx);
                    }
                }
            }

            let Some(winner) = winner else {
                return Ok(None);
            };
            let Some((key, value)) = self.heads[winner].take() else {
                return Ok(None);
            };

            // Shadowed versions of the same key in older sources
            for idx in 0..self.heads.len() {
                let shadowed = matches!(&self.heads[idx], Some((k, _)) if *k == key);
                if idx == winner || shadowed {
                    self.pull(idx)?;
                }
            }

            if value.is_some() || self.keep_tombstones {
                return Ok(Some((key, value)));
            }
        }
    }
}

impl Iterator for MergeIterator {
    type Item = Result<(Vec<u8>, Option<Vec<u8>>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
