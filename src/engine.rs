//! Engine Module
//!
//! The LSM engine coordinating WAL, memtable, disk tables, and
//! compaction.
//!
//! ## Responsibilities
//! - Append every mutation to the WAL before it touches the memtable
//! - Flush the memtable into a new disk-table generation past threshold
//! - Answer reads from the memtable, then generations newest → oldest
//! - Bound the generation count through compaction
//! - Rebuild the memtable from the WAL at open
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader
//!
//! - **Writes** (put/delete/flush/compaction): serialized by
//!   `write_lock`; flush and compaction run inline on the writing
//!   thread, so a single write can carry their latency.
//! - **Reads** (get): no write lock. A read clones the `Arc` behind the
//!   memtable pointer and the generation list under short read locks;
//!   flush/compaction replace those `Arc`s rather than mutating in
//!   place, so an in-flight read sees either the full pre-flush view or
//!   the full post-flush view, never a partial one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{Config, MAX_KEY_SIZE, MAX_VALUE_SIZE};
use crate::error::{KvError, Result};
use crate::manifest::Manifest;
use crate::memtable::{Entry, MemTable};
use crate::table::{self, DiskTableReader};
use crate::compaction;
use crate::wal::{self, Operation, WalWriter, WAL_FILE_NAME};

/// The main storage engine
#[derive(Debug)]
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log handle (exclusive access)
    wal: Mutex<WalWriter>,

    /// Active write buffer; the `Arc` is swapped, never mutated, when a
    /// flush completes
    memtable: RwLock<Arc<MemTable>>,

    /// Live disk-table readers, newest first; swapped as a whole by
    /// flush and compaction
    tables: RwLock<Arc<Vec<Arc<DiskTableReader>>>>,

    /// Persistent generation metadata, mutated only under `write_lock`
    manifest: Mutex<Manifest>,

    /// Serializes put/delete/flush/compaction
    write_lock: Mutex<()>,
}

impl Engine {
    /// Open an engine over an existing directory.
    ///
    /// On startup:
    /// 1. Validate the tunables and verify the directory exists
    /// 2. Replay the WAL into a fresh memtable (tolerating a torn tail)
    /// 3. Load the manifest and open a reader per live generation,
    ///    refusing to start if any generation's files are missing
    pub fn open(config: Config) -> Result<Self> {
        if config.sparse_key_distance == 0 {
            return Err(KvError::Config(
                "sparse_key_distance must be at least 1".to_string(),
            ));
        }
        if !config.data_dir.is_dir() {
            return Err(KvError::DirectoryNotFound(config.data_dir.clone()));
        }

        let wal_path = config.data_dir.join(WAL_FILE_NAME);

        let (memtable, stats) = wal::replay(&wal_path)?;
        if stats.records_applied > 0 || stats.torn_tail || stats.corrupt_tail {
            info!(
                records_applied = stats.records_applied,
                torn_tail = stats.torn_tail,
                corrupt_tail = stats.corrupt_tail,
                "recovered memtable from WAL"
            );
        }

        let wal = WalWriter::open(&wal_path)?;

        let manifest = Manifest::load(&config.data_dir)?;
        let mut readers = Vec::with_capacity(manifest.live.len());
        for &index in &manifest.live {
            readers.push(Arc::new(DiskTableReader::open(&config.data_dir, index)?));
        }

        info!(
            data_dir = %config.data_dir.display(),
            generations = manifest.live.len(),
            memtable_entries = memtable.len(),
            "engine open"
        );

        Ok(Self {
            config,
            wal: Mutex::new(wal),
            memtable: RwLock::new(Arc::new(memtable)),
            tables: RwLock::new(Arc::new(readers)),
            manifest: Mutex::new(manifest),
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path and default tunables (convenience method)
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key.
    ///
    /// Search order: memtable (most recent state) first, then live
    /// generations newest to oldest. A tombstone anywhere along the way
    /// answers "absent" without consulting older generations.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let memtable = self.memtable.read().clone();
        if let Some(entry) = memtable.get(key) {
            return match entry {
                Entry::Value(value) => Ok(Some(value)),
                Entry::Tombstone => Ok(None),
            };
        }

        let tables = self.tables.read().clone();
        for reader in tables.iter() {
            match reader.get(key)? {
                Some(Entry::Value(value)) => return Ok(Some(value)),
                Some(Entry::Tombstone) => return Ok(None),
                None => continue,
            }
        }

        Ok(None)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key-value pair.
    ///
    /// Steps: validate → WAL append (durable) → memtable insert →
    /// threshold-triggered flush → threshold-triggered compaction.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        validate_key(key)?;
        validate_value(value)?;

        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(&Operation::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;

        let size = self.memtable.read().put(key, value.to_vec());

        if size > self.config.memtable_threshold {
            self.flush_locked()?;
            self.maybe_compact_locked()?;
        }

        Ok(())
    }

    /// Delete a key by recording a tombstone.
    ///
    /// Deleting an absent key is not an error; the tombstone still has
    /// to shadow whatever older generations may hold.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        validate_key(key)?;

        let _write_guard = self.write_lock.lock();

        self.wal.lock().append(&Operation::Delete { key: key.to_vec() })?;

        let size = self.memtable.read().delete(key);

        if size > self.config.memtable_threshold {
            self.flush_locked()?;
            self.maybe_compact_locked()?;
        }

        Ok(())
    }

    /// Flush the memtable to a new disk-table generation regardless of
    /// its size. The generation count is re-checked afterwards, so
    /// explicit flushes trigger compaction just like threshold flushes.
    pub fn flush(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.flush_locked()?;
        self.maybe_compact_locked()
    }

    /// Close the engine.
    ///
    /// Syncs and drops the WAL handle. Nothing is flushed: a non-empty
    /// memtable is fully recoverable from the WAL on the next open.
    pub fn close(self) -> Result<()> {
        self.wal.lock().sync()?;
        Ok(())
    }

    // =========================================================================
    // Flush (write lock held)
    // =========================================================================

    /// Drain the memtable into the next generation.
    ///
    /// Ordering matters for crash safety: the generation's files are
    /// written and fsynced, the manifest is atomically replaced, the
    /// in-memory views are swapped, and only then is the WAL truncated.
    /// A crash at any point leaves either the old state authoritative
    /// or the new generation fully registered (a WAL replayed after the
    /// manifest update merely re-creates entries the table already
    /// holds).
    fn flush_locked(&self) -> Result<()> {
        let memtable = self.memtable.read().clone();
        if memtable.is_empty() {
            return Ok(());
        }

        let dir = &self.config.data_dir;
        let mut manifest = self.manifest.lock();
        let index = manifest.next_index;

        let result = self.write_generation(&memtable, index);
        let reader = match result {
            Ok(reader) => reader,
            Err(e) => {
                // The partial generation was never registered; discard it.
                if let Err(cleanup) = table::remove_generation(dir, index) {
                    warn!(index, error = %cleanup, "failed to remove partial disk table");
                }
                return Err(e);
            }
        };

        let mut updated = manifest.clone();
        updated.next_index = index + 1;
        updated.live.insert(0, index);
        if let Err(e) = updated.store(dir) {
            if let Err(cleanup) = table::remove_generation(dir, index) {
                warn!(index, error = %cleanup, "failed to remove partial disk table");
            }
            return Err(e);
        }
        *manifest = updated;

        // Register the generation before emptying the memtable so a
        // concurrent read never finds the flushed keys in neither place.
        {
            let mut tables = self.tables.write();
            let mut next = Vec::with_capacity(tables.len() + 1);
            next.push(Arc::new(reader));
            next.extend(tables.iter().cloned());
            *tables = Arc::new(next);
        }
        *self.memtable.write() = Arc::new(MemTable::new());

        self.wal.lock().truncate()?;

        info!(
            index,
            entries = memtable.len(),
            bytes = memtable.bytes(),
            "flushed memtable to disk table"
        );

        Ok(())
    }

    /// Stream the memtable through a disk-table writer and open a
    /// reader over the result
    fn write_generation(&self, memtable: &MemTable, index: u64) -> Result<DiskTableReader> {
        let dir = &self.config.data_dir;
        let mut writer = table::DiskTableWriter::new(dir, index, self.config.sparse_key_distance)?;

        memtable.scan(|key, entry| writer.write(key, entry))?;
        writer.finish()?;

        DiskTableReader::open(dir, index)
    }

    // =========================================================================
    // Compaction (write lock held)
    // =========================================================================

    /// Merge the oldest generations when the live count exceeds the
    /// threshold, bringing it back to at most the threshold.
    fn maybe_compact_locked(&self) -> Result<()> {
        let dir = &self.config.data_dir;
        let mut manifest = self.manifest.lock();

        let live = manifest.live.len();
        let threshold = self.config.disk_table_num_threshold;
        if live <= threshold {
            return Ok(());
        }

        // Merging N of the oldest leaves live - N + 1 generations.
        let merge_count = (live - threshold + 1).min(live);
        let keep = live - merge_count;
        let victims: Vec<u64> = manifest.live[keep..].to_vec();

        // Tombstones may only vanish when nothing older than the merge
        // set survives. The victims are the oldest generations, so this
        // always holds; computed rather than assumed.
        let drop_tombstones = victims.last() == manifest.live.last();

        let output = manifest.next_index;
        if let Err(e) = compaction::compact(
            dir,
            &victims,
            output,
            self.config.sparse_key_distance,
            drop_tombstones,
        ) {
            if let Err(cleanup) = table::remove_generation(dir, output) {
                warn!(index = output, error = %cleanup, "failed to remove partial disk table");
            }
            return Err(e);
        }

        let reader = match DiskTableReader::open(dir, output) {
            Ok(reader) => Arc::new(reader),
            Err(e) => {
                if let Err(cleanup) = table::remove_generation(dir, output) {
                    warn!(index = output, error = %cleanup, "failed to remove partial disk table");
                }
                return Err(e);
            }
        };

        // The merged output holds only data older than the kept
        // generations, so it registers at the oldest position.
        let mut updated = manifest.clone();
        updated.next_index = output + 1;
        updated.live.truncate(keep);
        updated.live.push(output);
        if let Err(e) = updated.store(dir) {
            if let Err(cleanup) = table::remove_generation(dir, output) {
                warn!(index = output, error = %cleanup, "failed to remove partial disk table");
            }
            return Err(e);
        }
        *manifest = updated;

        {
            let mut tables = self.tables.write();
            let mut next: Vec<Arc<DiskTableReader>> = tables.iter().take(keep).cloned().collect();
            next.push(reader);
            *tables = Arc::new(next);
        }

        // Old generations are deleted only after deregistration; a
        // crash before this point leaves them intact and discoverable,
        // merely wasting space until the next compaction.
        for &victim in &victims {
            if let Err(e) = table::remove_generation(dir, victim) {
                warn!(index = victim, error = %e, "failed to remove compacted disk table");
            }
        }

        info!(
            merged = ?victims,
            output,
            live = manifest.live.len(),
            "compaction complete"
        );

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Current logical memtable size in bytes
    pub fn memtable_bytes(&self) -> usize {
        self.memtable.read().bytes()
    }

    /// Number of entries in the memtable
    pub fn memtable_len(&self) -> usize {
        self.memtable.read().len()
    }

    /// Number of live disk-table generations
    pub fn disk_table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Live generation indexes, newest first
    pub fn live_generations(&self) -> Vec<u64> {
        self.manifest.lock().live.clone()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the WAL file for a given engine directory
    pub fn wal_path(dir: &Path) -> PathBuf {
        dir.join(WAL_FILE_NAME)
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::KeyRequired);
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(KvError::KeyTooLarge(key.len()));
    }
    Ok(())
}

fn validate_value(value: &[u8]) -> Result<()> {
    if value.is_empty() {
        return Err(KvError::ValueRequired);
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge(value.len()));
    }
    Ok(())
}
