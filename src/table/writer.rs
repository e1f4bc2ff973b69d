//! Disk Table Writer
//!
//! Streams one generation to disk: every entry goes to the data file,
//! its offset to the dense index, and every `sparse_key_distance`-th
//! key (starting with the first) to the sparse index. The caller feeds
//! entries in strictly ascending key order; the writer never re-sorts.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::memtable::Entry;

use super::format;

/// Writes a new disk-table generation
pub struct DiskTableWriter {
    data: BufWriter<File>,
    index: BufWriter<File>,
    sparse: BufWriter<File>,

    data_path: PathBuf,
    index_path: PathBuf,
    sparse_path: PathBuf,

    sparse_key_distance: usize,
    key_num: usize,
    data_pos: u64,
    index_pos: u64,

    #[cfg(debug_assertions)]
    last_key: Option<Vec<u8>>,
}

impl DiskTableWriter {
    /// Create the three files of generation `index` in `dir`.
    ///
    /// `sparse_key_distance` must be at least 1 (1 samples every key).
    pub fn new(dir: &Path, index: u64, sparse_key_distance: usize) -> Result<Self> {
        assert!(sparse_key_distance >= 1, "sparse_key_distance must be >= 1");

        let data_path = super::data_path(dir, index);
        let index_path = super::index_path(dir, index);
        let sparse_path = super::sparse_path(dir, index);

        let open = |path: &Path| -> Result<BufWriter<File>> {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            Ok(BufWriter::new(file))
        };

        Ok(Self {
            data: open(&data_path)?,
            index: open(&index_path)?,
            sparse: open(&sparse_path)?,
            data_path,
            index_path,
            sparse_path,
            sparse_key_distance,
            key_num: 0,
            data_pos: 0,
            index_pos: 0,
            #[cfg(debug_assertions)]
            last_key: None,
        })
    }

    /// Append one entry.
    ///
    /// Keys must arrive in strictly ascending order; the flush and
    /// compaction routines guarantee this.
    pub fn write(&mut self, key: &[u8], entry: &Entry) -> Result<()> {
        #[cfg(debug_assertions)]
        {
            if let Some(last) = &self.last_key {
                debug_assert!(key > last.as_slice(), "keys must be strictly ascending");
            }
            self.last_key = Some(key.to_vec());
        }

        let data_record = format::encode_entry(key, entry);
        self.data.write_all(&data_record)?;

        let index_record = format::encode_key_offset(key, self.data_pos);
        self.index.write_all(&index_record)?;

        if self.key_num % self.sparse_key_distance == 0 {
            let sparse_record = format::encode_key_offset(key, self.index_pos);
            self.sparse.write_all(&sparse_record)?;
        }

        self.data_pos += data_record.len() as u64;
        self.index_pos += index_record.len() as u64;
        self.key_num += 1;

        Ok(())
    }

    /// Flush and fsync all three files.
    ///
    /// A generation is only linked into the live list after this
    /// succeeds; on any earlier failure the caller deletes the partial
    /// files via [`super::remove_generation`].
    pub fn finish(self) -> Result<()> {
        for writer in [self.data, self.index, self.sparse] {
            let file = writer
                .into_inner()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            file.sync_all()?;
        }
        Ok(())
    }

    /// Number of entries written so far
    pub fn entries(&self) -> usize {
        self.key_num
    }

    /// Byte offset where the next data record would land
    pub fn data_pos(&self) -> u64 {
        self.data_pos
    }

    /// Byte offset where the next index record would land
    pub fn index_pos(&self) -> u64 {
        self.index_pos
    }

    /// Paths of the three files being written
    pub fn paths(&self) -> (&Path, &Path, &Path) {
        (&self.data_path, &self.index_path, &self.sparse_path)
    }
}
