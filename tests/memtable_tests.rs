//! Tests for the MemTable
//!
//! These tests verify:
//! - Put/get/delete semantics including tombstones
//! - Previous-value replacement
//! - Logical byte accounting used for flush triggers
//! - Ascending-order scans

use corekv::memtable::{Entry, MemTable};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_get() {
    let table = MemTable::new();

    table.put(b"hello", b"world".to_vec());
    assert_eq!(table.get(b"hello"), Some(Entry::Value(b"world".to_vec())));
    assert_eq!(table.get(b"missing"), None);
}

#[test]
fn test_put_overwrites() {
    let table = MemTable::new();

    table.put(b"k", b"first".to_vec());
    table.put(b"k", b"second".to_vec());

    assert_eq!(table.get(b"k"), Some(Entry::Value(b"second".to_vec())));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_delete_leaves_tombstone() {
    let table = MemTable::new();

    table.put(b"k", b"v".to_vec());
    table.delete(b"k");

    // A tombstone is a present entry, not an absence
    assert_eq!(table.get(b"k"), Some(Entry::Tombstone));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_delete_of_absent_key_is_recorded() {
    let table = MemTable::new();

    table.delete(b"never-written");

    assert_eq!(table.get(b"never-written"), Some(Entry::Tombstone));
}

#[test]
fn test_put_after_delete_revives_key() {
    let table = MemTable::new();

    table.put(b"k", b"v1".to_vec());
    table.delete(b"k");
    table.put(b"k", b"v2".to_vec());

    assert_eq!(table.get(b"k"), Some(Entry::Value(b"v2".to_vec())));
}

// =============================================================================
// Byte Accounting Tests
// =============================================================================

#[test]
fn test_bytes_counts_keys_and_values() {
    let table = MemTable::new();
    assert_eq!(table.bytes(), 0);

    assert_eq!(table.put(b"a", b"12".to_vec()), 3); // 1 + 2
    assert_eq!(table.put(b"bb", b"345".to_vec()), 8); // + 2 + 3
}

#[test]
fn test_bytes_overwrite_adjusts_by_value_delta() {
    let table = MemTable::new();

    table.put(b"a", b"12".to_vec()); // 3
    assert_eq!(table.put(b"a", b"12345".to_vec()), 6); // key counted once
}

#[test]
fn test_bytes_delete_releases_value_keeps_key() {
    let table = MemTable::new();

    table.put(b"a", b"12345".to_vec()); // 6
    assert_eq!(table.delete(b"a"), 1); // value released, key remains

    // Deleting a fresh key still costs its key bytes
    assert_eq!(table.delete(b"zz"), 3);

    // Deleting an already-deleted key changes nothing
    assert_eq!(table.delete(b"a"), 3);
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_is_ascending_and_complete() {
    let table = MemTable::new();
    table.put(b"pear", b"4".to_vec());
    table.put(b"apple", b"1".to_vec());
    table.delete(b"fig");
    table.put(b"banana", b"2".to_vec());

    let mut seen = Vec::new();
    table
        .scan(|key, entry| {
            seen.push((key.to_vec(), entry.clone()));
            Ok(())
        })
        .unwrap();

    assert_eq!(
        seen,
        vec![
            (b"apple".to_vec(), Entry::Value(b"1".to_vec())),
            (b"banana".to_vec(), Entry::Value(b"2".to_vec())),
            (b"fig".to_vec(), Entry::Tombstone),
            (b"pear".to_vec(), Entry::Value(b"4".to_vec())),
        ]
    );
}

#[test]
fn test_scan_propagates_errors() {
    let table = MemTable::new();
    table.put(b"a", b"1".to_vec());
    table.put(b"b", b"2".to_vec());

    let mut visited = 0;
    let result = table.scan(|_, _| {
        visited += 1;
        Err(std::io::Error::new(std::io::ErrorKind::Other, "stop").into())
    });

    assert!(result.is_err());
    assert_eq!(visited, 1);
}

#[test]
fn test_many_keys_stay_sorted() {
    let table = MemTable::new();
    for i in (0..500u32).rev() {
        table.put(format!("key{i:05}").as_bytes(), b"v".to_vec());
    }

    let mut previous: Option<Vec<u8>> = None;
    table
        .scan(|key, _| {
            if let Some(prev) = &previous {
                assert!(key > prev.as_slice());
            }
            previous = Some(key.to_vec());
            Ok(())
        })
        .unwrap();

    assert_eq!(table.len(), 500);
}
