//! Atomic file replacement
//!
//! Small control files (the manifest) must be either fully old or fully
//! new after any crash, never half-written. The sequence that guarantees
//! this on POSIX filesystems:
//!
//! 1. Write the new contents to a temporary file in the same directory
//! 2. fsync the temporary file
//! 3. rename it over the target (atomic on the same filesystem)
//! 4. fsync the containing directory so the rename itself is durable

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process;

use crate::error::Result;

/// Atomically replace `path` with `data`.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(format!("tmp.{}", process::id()));

    let mut tmp = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;

    if let Err(e) = tmp.write_all(data).and_then(|_| tmp.sync_all()) {
        drop(tmp);
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    drop(tmp);

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // The rename is only durable once the directory entry is synced.
    if let Some(dir) = path.parent() {
        File::open(dir)?.sync_all()?;
    }

    Ok(())
}
