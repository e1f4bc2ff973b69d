//! MemTable Module
//!
//! In-memory ordered write buffer holding the most recent writes.
//!
//! ## Responsibilities
//! - Fast ordered reads and writes in memory
//! - Tombstone tracking for deletions
//! - Logical byte accounting for flush triggers
//! - Ascending iteration for disk-table creation
//!
//! ## Data Structure Choice
//! A red-black tree keyed by raw byte sequences:
//! - Ordered keys (required for disk-table generation)
//! - O(log n) insert/lookup with bounded rebalancing
//! - Arena-indexed nodes rather than pointer links; the tree never
//!   removes nodes (tombstones are regular entries and the whole table
//!   is discarded after a flush), so the arena only grows

mod rbtree;
mod table;

pub use rbtree::RbTree;
pub use table::MemTable;

/// Entry stored in the MemTable and in disk tables.
///
/// A deletion is a distinct variant, not an empty value: the marker has
/// to stay visible across generations until compaction drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A live value
    Value(Vec<u8>),

    /// A tombstone (deleted key)
    Tombstone,
}

impl Entry {
    /// Logical byte footprint of the value part (tombstones count zero)
    pub fn value_len(&self) -> usize {
        match self {
            Entry::Value(v) => v.len(),
            Entry::Tombstone => 0,
        }
    }
}
