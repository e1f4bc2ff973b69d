//! Disk Table Reader
//!
//! Point lookups against one generation. The sparse index is loaded
//! fully into memory at open; a lookup binary-searches it for a
//! starting offset, scans the dense index forward a bounded distance
//! (at most `sparse_key_distance` records), then fetches one framed
//! entry from the data file.
//!
//! The two file handles sit behind mutexes so lookups work through
//! `&self` and generations can be shared across concurrent readers.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{KvError, Result};
use crate::memtable::Entry;

use super::format;

/// Reader over one immutable disk-table generation
#[derive(Debug)]
pub struct DiskTableReader {
    generation: u64,

    /// Sparse index: `(key, offset into the dense index file)`,
    /// ascending, resident in memory
    sparse: Vec<(Vec<u8>, u64)>,

    index_file: Mutex<File>,
    data_file: Mutex<File>,

    data_path: PathBuf,
}

impl DiskTableReader {
    /// Open generation `index` in `dir`.
    ///
    /// All three files must exist; a generation that the manifest
    /// references but whose files are missing is a consistency error
    /// and refuses to open.
    pub fn open(dir: &Path, index: u64) -> Result<Self> {
        let data_path = super::data_path(dir, index);
        let index_path = super::index_path(dir, index);
        let sparse_path = super::sparse_path(dir, index);

        for path in [&data_path, &index_path, &sparse_path] {
            if !path.is_file() {
                return Err(KvError::Consistency(format!(
                    "disk table {} is missing {}",
                    index,
                    path.display()
                )));
            }
        }

        // The sparse index is small by construction; keep it resident
        let mut sparse = Vec::new();
        let mut sparse_reader = BufReader::new(File::open(&sparse_path)?);
        while let Some(entry) = format::read_key_offset(&mut sparse_reader)? {
            sparse.push(entry);
        }

        Ok(Self {
            generation: index,
            sparse,
            index_file: Mutex::new(File::open(&index_path)?),
            data_file: Mutex::new(File::open(&data_path)?),
            data_path,
        })
    }

    /// Look up a key.
    ///
    /// Returns `Some(Entry::Tombstone)` for a key this generation knows
    /// to be deleted, distinct from `None` (not present here), so the
    /// engine stops searching older generations instead of resurrecting
    /// a stale value.
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        let Some(index_offset) = self.scan_start(key) else {
            return Ok(None);
        };

        let Some(data_offset) = self.find_in_index(key, index_offset)? else {
            return Ok(None);
        };

        let (found_key, entry) = self.read_data_entry(data_offset)?;
        if found_key != key {
            return Err(KvError::Corruption(format!(
                "disk table {}: index points at a different key",
                self.generation
            )));
        }

        Ok(Some(entry))
    }

    /// Generation number of this table
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of sparse index samples held in memory
    pub fn sparse_len(&self) -> usize {
        self.sparse.len()
    }

    // =========================================================================
    // Lookup steps
    // =========================================================================

    /// Binary-search the sparse index for the dense-index offset of the
    /// largest sampled key `<=` the target. `None` means the key sorts
    /// before the table's first key (or the table is empty): a miss.
    fn scan_start(&self, key: &[u8]) -> Option<u64> {
        let upper = self.sparse.partition_point(|(k, _)| k.as_slice() <= key);
        if upper == 0 {
            return None;
        }
        Some(self.sparse[upper - 1].1)
    }

    /// Scan the dense index forward from `start` until the key matches
    /// (returning its data offset), a greater key appears, or the index
    /// ends.
    fn find_in_index(&self, key: &[u8], start: u64) -> Result<Option<u64>> {
        let mut file = self.index_file.lock();
        file.seek(SeekFrom::Start(start))?;
        let mut reader = BufReader::new(&mut *file);

        while let Some((index_key, data_offset)) = format::read_key_offset(&mut reader)? {
            match index_key.as_slice().cmp(key) {
                std::cmp::Ordering::Equal => return Ok(Some(data_offset)),
                std::cmp::Ordering::Greater => return Ok(None),
                std::cmp::Ordering::Less => continue,
            }
        }
        Ok(None)
    }

    /// Decode the framed entry at `offset` in the data file
    fn read_data_entry(&self, offset: u64) -> Result<(Vec<u8>, Entry)> {
        let mut file = self.data_file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(&mut *file);

        format::read_entry(&mut reader)?.ok_or_else(|| {
            KvError::Corruption(format!(
                "disk table {}: data offset {} past end of {}",
                self.generation,
                offset,
                self.data_path.display()
            ))
        })
    }
}
