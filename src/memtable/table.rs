//! MemTable implementation
//!
//! Red-black tree wrapped in an RwLock, with logical byte accounting
//! used to decide when the engine should flush.

use parking_lot::RwLock;

use crate::error::Result;

use super::{Entry, RbTree};

/// In-memory table for recent writes.
///
/// Byte accounting counts key bytes once per distinct key plus the
/// current value length; tombstones contribute zero value bytes. The
/// result is the logical footprint a flush would have to write, not the
/// allocator footprint.
#[derive(Debug)]
pub struct MemTable {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    tree: RbTree,
    bytes: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                tree: RbTree::new(),
                bytes: 0,
            }),
        }
    }

    /// Get the entry for a key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Entry> {
        self.inner.read().tree.get(key).cloned()
    }

    /// Insert a key-value pair (write lock).
    ///
    /// Returns the table's logical byte size after the insert so the
    /// caller can check its flush threshold without re-locking.
    pub fn put(&self, key: &[u8], value: Vec<u8>) -> usize {
        let value_len = value.len();
        let mut inner = self.inner.write();

        match inner.tree.insert(key, Entry::Value(value)) {
            None => inner.bytes += key.len() + value_len,
            Some(prev) => {
                inner.bytes = inner.bytes - prev.value_len() + value_len;
            }
        }
        inner.bytes
    }

    /// Record a deletion as a tombstone (write lock).
    ///
    /// Returns the logical byte size after the delete. A tombstone for a
    /// fresh key still costs its key bytes; deleting an existing key
    /// releases the old value's bytes.
    pub fn delete(&self, key: &[u8]) -> usize {
        let mut inner = self.inner.write();

        match inner.tree.insert(key, Entry::Tombstone) {
            None => inner.bytes += key.len(),
            Some(prev) => inner.bytes -= prev.value_len(),
        }
        inner.bytes
    }

    /// Current logical footprint in bytes
    pub fn bytes(&self) -> usize {
        self.inner.read().bytes
    }

    /// Number of distinct keys (values and tombstones)
    pub fn len(&self) -> usize {
        self.inner.read().tree.len()
    }

    /// Check whether the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.read().tree.is_empty()
    }

    /// Visit every entry in ascending key order under the read lock.
    ///
    /// Drives the tree's lazy iterator; used by flush to stream entries
    /// into a disk-table writer without materializing the table.
    pub fn scan<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &Entry) -> Result<()>,
    {
        let inner = self.inner.read();
        for (key, entry) in inner.tree.iter() {
            visit(key, entry)?;
        }
        Ok(())
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
