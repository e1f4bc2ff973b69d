//! Configuration for corekv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Maximum key size in bytes (must fit a u16 length field)
pub const MAX_KEY_SIZE: usize = u16::MAX as usize;

/// Maximum value size in bytes.
///
/// One less than the u16 maximum: the top length value (0xFFFF) is the
/// on-disk tombstone sentinel.
pub const MAX_VALUE_SIZE: usize = u16::MAX as usize - 1;

/// Default memtable flush threshold in logical bytes
pub const DEFAULT_MEMTABLE_THRESHOLD: usize = 64_000;

/// Default sparse index sampling stride
pub const DEFAULT_SPARSE_KEY_DISTANCE: usize = 128;

/// Default number of disk tables tolerated before compaction
pub const DEFAULT_DISK_TABLE_NUM_THRESHOLD: usize = 10;

/// Main configuration for a corekv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files. Must already exist at open.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── wal.db           (write-ahead log)
    ///     ├── manifest.db      (generation metadata, atomically replaced)
    ///     └── {N}-data.db / {N}-index.db / {N}-sparse.db  (disk tables)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Logical byte size of the memtable that triggers a flush
    pub memtable_threshold: usize,

    // -------------------------------------------------------------------------
    // Disk Table Configuration
    // -------------------------------------------------------------------------
    /// Every Nth dense-index entry is sampled into the sparse index
    pub sparse_key_distance: usize,

    /// Number of live disk tables that triggers a compaction
    pub disk_table_num_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./corekv_data"),
            memtable_threshold: DEFAULT_MEMTABLE_THRESHOLD,
            sparse_key_distance: DEFAULT_SPARSE_KEY_DISTANCE,
            disk_table_num_threshold: DEFAULT_DISK_TABLE_NUM_THRESHOLD,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the memtable flush threshold (in logical bytes)
    pub fn memtable_threshold(mut self, bytes: usize) -> Self {
        self.config.memtable_threshold = bytes;
        self
    }

    /// Set the sparse index sampling stride
    pub fn sparse_key_distance(mut self, distance: usize) -> Self {
        self.config.sparse_key_distance = distance;
        self
    }

    /// Set the disk-table count that triggers compaction
    pub fn disk_table_num_threshold(mut self, count: usize) -> Self {
        self.config.disk_table_num_threshold = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
