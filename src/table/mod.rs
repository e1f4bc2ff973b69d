//! Disk Table Module
//!
//! Immutable sorted on-disk tables (one "generation" per flush or
//! compaction). Each generation is a triple of companion files named by
//! its numeric index:
//!
//! ```text
//! {N}-data.db     entries in ascending key order
//! {N}-index.db    (key, data_offset) for every entry (dense index)
//! {N}-sparse.db   (key, index_offset) for every Nth entry
//! ```
//!
//! ## File Formats
//! ```text
//! data record:   ┌─────────────┬─────┬───────────────────────┬───────┐
//!                │ key_len (2) │ key │ value_len_or_FFFF (2) │ value │
//!                └─────────────┴─────┴───────────────────────┴───────┘
//! index record:  ┌─────────────┬─────┬────────────┐
//!                │ key_len (2) │ key │ offset (8) │
//!                └─────────────┴─────┴────────────┘
//! ```
//! All integers little-endian; no file headers. Once written, a
//! generation's files are never mutated, only deleted after a
//! compaction supersedes them.

pub mod format;

mod reader;
mod writer;

pub use reader::DiskTableReader;
pub use writer::DiskTableWriter;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Path of a generation's data file
pub fn data_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{index}-data.db"))
}

/// Path of a generation's dense index file
pub fn index_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{index}-index.db"))
}

/// Path of a generation's sparse index file
pub fn sparse_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{index}-sparse.db"))
}

/// Delete a generation's three files, ignoring files already gone.
///
/// Used both to discard a partially written generation after a failed
/// flush and to reclaim superseded generations after a compaction.
pub fn remove_generation(dir: &Path, index: u64) -> Result<()> {
    for path in [
        data_path(dir, index),
        index_path(dir, index),
        sparse_path(dir, index),
    ] {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
