//! Tests for Disk Table writer and reader
//!
//! These tests verify:
//! - The three-file generation layout and running offsets
//! - Sparse index sampling at the configured stride
//! - Point lookups: hits, misses, and tombstone hits
//! - Consistency failures for generations with missing files

use std::fs;

use corekv::error::KvError;
use corekv::memtable::Entry;
use corekv::table::{self, DiskTableReader, DiskTableWriter};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Write one generation from sorted `(key, entry)` pairs
fn write_generation(
    dir: &TempDir,
    index: u64,
    sparse_key_distance: usize,
    entries: &[(&[u8], Entry)],
) {
    let mut writer = DiskTableWriter::new(dir.path(), index, sparse_key_distance).unwrap();
    for (key, entry) in entries {
        writer.write(key, entry).unwrap();
    }
    writer.finish().unwrap();
}

fn value(bytes: &[u8]) -> Entry {
    Entry::Value(bytes.to_vec())
}

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_creates_three_files() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 7, 2, &[(b"a", value(b"1"))]);

    assert!(table::data_path(dir.path(), 7).is_file());
    assert!(table::index_path(dir.path(), 7).is_file());
    assert!(table::sparse_path(dir.path(), 7).is_file());
}

#[test]
fn test_writer_tracks_offsets_and_entries() {
    let dir = TempDir::new().unwrap();
    let mut writer = DiskTableWriter::new(dir.path(), 0, 128).unwrap();

    writer.write(b"ab", &value(b"123")).unwrap(); // data 2+2+2+3 = 9, index 2+2+8 = 12
    assert_eq!(writer.data_pos(), 9);
    assert_eq!(writer.index_pos(), 12);

    writer.write(b"cd", &Entry::Tombstone).unwrap(); // data 2+2+2 = 6
    assert_eq!(writer.data_pos(), 15);
    assert_eq!(writer.index_pos(), 24);
    assert_eq!(writer.entries(), 2);

    writer.finish().unwrap();
}

#[test]
fn test_sparse_index_samples_every_nth_key() {
    let dir = TempDir::new().unwrap();
    let entries: Vec<(Vec<u8>, Entry)> = (0..10u8)
        .map(|i| (vec![b'a' + i], value(b"v")))
        .collect();

    let mut writer = DiskTableWriter::new(dir.path(), 0, 4).unwrap();
    for (key, entry) in &entries {
        writer.write(key, entry).unwrap();
    }
    writer.finish().unwrap();

    // Keys 0, 4, 8 are sampled: ceil(10 / 4) = 3 entries
    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    assert_eq!(reader.sparse_len(), 3);
}

#[test]
fn test_sparse_distance_one_samples_everything() {
    let dir = TempDir::new().unwrap();
    write_generation(
        &dir,
        0,
        1,
        &[(b"a", value(b"1")), (b"b", value(b"2")), (b"c", value(b"3"))],
    );

    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    assert_eq!(reader.sparse_len(), 3);
}

// =============================================================================
// Reader Lookup Tests
// =============================================================================

#[test]
fn test_lookup_hits_every_key() {
    let dir = TempDir::new().unwrap();
    let entries: Vec<(Vec<u8>, Entry)> = (0..100u32)
        .map(|i| (format!("key{i:04}").into_bytes(), value(format!("val{i}").as_bytes())))
        .collect();

    // Stride larger than one so most lookups cross sparse gaps
    let mut writer = DiskTableWriter::new(dir.path(), 3, 7).unwrap();
    for (key, entry) in &entries {
        writer.write(key, entry).unwrap();
    }
    writer.finish().unwrap();

    let reader = DiskTableReader::open(dir.path(), 3).unwrap();
    for (key, entry) in &entries {
        assert_eq!(reader.get(key).unwrap().as_ref(), Some(entry), "key {key:?}");
    }
}

#[test]
fn test_lookup_misses() {
    let dir = TempDir::new().unwrap();
    write_generation(
        &dir,
        0,
        2,
        &[(b"bb", value(b"1")), (b"dd", value(b"2")), (b"ff", value(b"3"))],
    );

    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    assert_eq!(reader.get(b"aa").unwrap(), None); // before first key
    assert_eq!(reader.get(b"cc").unwrap(), None); // between keys
    assert_eq!(reader.get(b"zz").unwrap(), None); // past last key
}

#[test]
fn test_lookup_reports_tombstone_distinctly() {
    let dir = TempDir::new().unwrap();
    write_generation(
        &dir,
        0,
        2,
        &[(b"alive", value(b"1")), (b"dead", Entry::Tombstone)],
    );

    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    // "found, deleted" is not the same answer as "not found"
    assert_eq!(reader.get(b"dead").unwrap(), Some(Entry::Tombstone));
    assert_eq!(reader.get(b"gone").unwrap(), None);
}

#[test]
fn test_empty_generation_always_misses() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 0, 2, &[]);

    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    assert_eq!(reader.get(b"anything").unwrap(), None);
}

#[test]
fn test_values_survive_byte_for_byte() {
    let dir = TempDir::new().unwrap();
    let binary_value: Vec<u8> = (0..=255u8).collect();
    write_generation(&dir, 0, 2, &[(b"bin", Entry::Value(binary_value.clone()))]);

    let reader = DiskTableReader::open(dir.path(), 0).unwrap();
    assert_eq!(reader.get(b"bin").unwrap(), Some(Entry::Value(binary_value)));
}

// =============================================================================
// Consistency Tests
// =============================================================================

#[test]
fn test_open_fails_when_a_file_is_missing() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 5, 2, &[(b"a", value(b"1"))]);

    fs::remove_file(table::sparse_path(dir.path(), 5)).unwrap();

    match DiskTableReader::open(dir.path(), 5) {
        Err(KvError::Consistency(_)) => {}
        other => panic!("expected consistency error, got {other:?}"),
    }
}

#[test]
fn test_remove_generation_deletes_all_files() {
    let dir = TempDir::new().unwrap();
    write_generation(&dir, 2, 2, &[(b"a", value(b"1"))]);

    table::remove_generation(dir.path(), 2).unwrap();

    assert!(!table::data_path(dir.path(), 2).exists());
    assert!(!table::index_path(dir.path(), 2).exists());
    assert!(!table::sparse_path(dir.path(), 2).exists());

    // Removing an absent generation is not an error
    table::remove_generation(dir.path(), 2).unwrap();
}
