//! Tests for compaction
//!
//! These tests verify:
//! - K-way merging preserves ascending order and completeness
//! - Duplicate keys resolve to the newest generation in the merge set
//! - Tombstone dropping, and retention when older generations survive

use corekv::compaction::compact;
use corekv::memtable::Entry;
use corekv::table::{DiskTableReader, DiskTableWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_generation(dir: &TempDir, index: u64, entries: &[(&[u8], Entry)]) {
    let mut writer = DiskTableWriter::new(dir.path(), index, 2).unwrap();
    for (key, entry) in entries {
        writer.write(key, entry).unwrap();
    }
    writer.finish().unwrap();
}

fn value(bytes: &[u8]) -> Entry {
    Entry::Value(bytes.to_vec())
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_merge_combines_disjoint_generations() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, &[(b"a", value(b"1")), (b"c", value(b"3"))]);
    write_generation(&dir, 1, &[(b"b", value(b"2")), (b"d", value(b"4"))]);

    // Sources newest first
    compact(dir.path(), &[1, 0], 2, 2, true).unwrap();

    let reader = DiskTableReader::open(dir.path(), 2).unwrap();
    assert_eq!(reader.get(b"a").unwrap(), Some(value(b"1")));
    assert_eq!(reader.get(b"b").unwrap(), Some(value(b"2")));
    assert_eq!(reader.get(b"c").unwrap(), Some(value(b"3")));
    assert_eq!(reader.get(b"d").unwrap(), Some(value(b"4")));
}

#[test]
fn test_merge_newest_generation_wins_duplicates() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, &[(b"a", value(b"old")), (b"b", value(b"keep"))]);
    write_generation(&dir, 1, &[(b"a", value(b"new"))]);

    compact(dir.path(), &[1, 0], 2, 2, true).unwrap();

    let reader = DiskTableReader::open(dir.path(), 2).unwrap();
    assert_eq!(reader.get(b"a").unwrap(), Some(value(b"new")));
    assert_eq!(reader.get(b"b").unwrap(), Some(value(b"keep")));
}

#[test]
fn test_merge_three_way_chain_of_overwrites() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, &[(b"k", value(b"v0")), (b"x", value(b"x0"))]);
    write_generation(&dir, 1, &[(b"k", value(b"v1")), (b"y", value(b"y1"))]);
    write_generation(&dir, 2, &[(b"k", value(b"v2"))]);

    compact(dir.path(), &[2, 1, 0], 3, 2, true).unwrap();

    let reader = DiskTableReader::open(dir.path(), 3).unwrap();
    assert_eq!(reader.get(b"k").unwrap(), Some(value(b"v2")));
    assert_eq!(reader.get(b"x").unwrap(), Some(value(b"x0")));
    assert_eq!(reader.get(b"y").unwrap(), Some(value(b"y1")));
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_tombstones_dropped_when_nothing_older_remains() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, &[(b"doomed", value(b"v")), (b"kept", value(b"k"))]);
    write_generation(&dir, 1, &[(b"doomed", Entry::Tombstone)]);

    compact(dir.path(), &[1, 0], 2, 2, true).unwrap();

    let reader = DiskTableReader::open(dir.path(), 2).unwrap();
    // The key and its marker are both gone entirely
    assert_eq!(reader.get(b"doomed").unwrap(), None);
    assert_eq!(reader.get(b"kept").unwrap(), Some(value(b"k")));
}

#[test]
fn test_tombstones_kept_when_older_generations_survive() {
    let dir = TempDir::new().unwrap();
    // An even-older generation outside the merge set holds a stale value
    write_generation(&dir, 0, &[(b"doomed", value(b"stale"))]);
    write_generation(&dir, 1, &[(b"doomed", Entry::Tombstone)]);
    write_generation(&dir, 2, &[(b"other", value(b"v"))]);

    // Merge only generations 2 and 1; 0 survives, so the marker must too
    compact(dir.path(), &[2, 1], 3, 2, false).unwrap();

    let reader = DiskTableReader::open(dir.path(), 3).unwrap();
    assert_eq!(reader.get(b"doomed").unwrap(), Some(Entry::Tombstone));
    assert_eq!(reader.get(b"other").unwrap(), Some(value(b"v")));
}

#[test]
fn test_merge_of_all_tombstones_yields_empty_generation() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, &[(b"a", Entry::Tombstone)]);
    write_generation(&dir, 1, &[(b"b", Entry::Tombstone)]);

    compact(dir.path(), &[1, 0], 2, 2, true).unwrap();

    let reader = DiskTableReader::open(dir.path(), 2).unwrap();
    assert_eq!(reader.get(b"a").unwrap(), None);
    assert_eq!(reader.get(b"b").unwrap(), None);
}
