//! WAL Writer
//!
//! Append-only handle to the WAL file. Every append reaches stable
//! storage before it returns; the engine's crash contract depends on
//! the record being durable before the memtable changes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::record::write_record;
use super::Operation;

/// Writes operations to the WAL file
#[derive(Debug)]
pub struct WalWriter {
    file: File,
    path: PathBuf,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Append one operation and sync it to stable storage
    pub fn append(&mut self, operation: &Operation) -> Result<()> {
        let payload = operation.encode();
        write_record(&mut self.file, &payload)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Discard all records.
    ///
    /// Called after a successful flush: every WAL record is now durable
    /// in the new disk table, so the log restarts empty.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
