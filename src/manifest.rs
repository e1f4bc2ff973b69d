//! Manifest: persisted disk-table metadata
//!
//! The control file records the next generation index to allocate and
//! the ordered list of live generations, newest first. Keeping the list
//! explicit (rather than scanning the directory at open) makes the
//! flush/compaction/open logic pure over an in-memory value, and lets a
//! compacted generation carry a fresh index while still sitting at the
//! oldest position of the lookup order.
//!
//! The file is always replaced through the atomic-write helper, so a
//! crash mid-update leaves either the old manifest or the new one,
//! never a torn in-between.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::atomicfile::write_atomic;
use crate::error::{KvError, Result};

/// Name of the control file inside the engine directory
pub const MANIFEST_FILE_NAME: &str = "manifest.db";

/// Persistent generation metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Next generation index to allocate; indexes are globally unique
    /// and never reused
    pub next_index: u64,

    /// Live generation indexes, newest first in lookup order
    pub live: Vec<u64>,
}

impl Manifest {
    /// Empty manifest for a fresh directory
    pub fn new() -> Self {
        Self::default()
    }

    fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE_NAME)
    }

    /// Load the manifest from `dir`; a missing file means a fresh engine
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::new());
        }

        let bytes = std::fs::read(&path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| KvError::Serialization(format!("manifest decode failed: {e}")))
    }

    /// Atomically persist the manifest into `dir`
    pub fn store(&self, dir: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| KvError::Serialization(format!("manifest encode failed: {e}")))?;
        write_atomic(&Self::path(dir), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest, Manifest::new());
    }

    #[test]
    fn round_trips_through_atomic_write() {
        let dir = TempDir::new().unwrap();

        let manifest = Manifest {
            next_index: 7,
            live: vec![6, 3, 1],
        };
        manifest.store(dir.path()).unwrap();

        assert_eq!(Manifest::load(dir.path()).unwrap(), manifest);
    }

    #[test]
    fn store_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();

        Manifest { next_index: 1, live: vec![0] }.store(dir.path()).unwrap();
        let updated = Manifest { next_index: 2, live: vec![1, 0] };
        updated.store(dir.path()).unwrap();

        assert_eq!(Manifest::load(dir.path()).unwrap(), updated);
    }
}
