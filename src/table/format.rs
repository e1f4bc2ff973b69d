//! Record codecs shared by the data, index, and sparse index files
//!
//! Disk-table files are fsynced before a generation goes live, so the
//! readers here treat a short read inside a record as corruption; only
//! end-of-file at a record boundary is expected.

use std::io::{ErrorKind, Read};

use crate::error::{KvError, Result};
use crate::memtable::Entry;

/// Value-length slot marking a tombstone in a data record
pub const TOMBSTONE_SENTINEL: u16 = u16::MAX;

// =============================================================================
// Data Records
// =============================================================================

/// Encode one data record: `key_len | key | value_len_or_sentinel | value`
pub fn encode_entry(key: &[u8], entry: &Entry) -> Vec<u8> {
    match entry {
        Entry::Value(value) => {
            let mut record = Vec::with_capacity(4 + key.len() + value.len());
            record.extend_from_slice(&(key.len() as u16).to_le_bytes());
            record.extend_from_slice(key);
            record.extend_from_slice(&(value.len() as u16).to_le_bytes());
            record.extend_from_slice(value);
            record
        }
        Entry::Tombstone => {
            let mut record = Vec::with_capacity(4 + key.len());
            record.extend_from_slice(&(key.len() as u16).to_le_bytes());
            record.extend_from_slice(key);
            record.extend_from_slice(&TOMBSTONE_SENTINEL.to_le_bytes());
            record
        }
    }
}

/// Decode one data record, or `None` at a clean end of file
pub fn read_entry<R: Read>(reader: &mut R) -> Result<Option<(Vec<u8>, Entry)>> {
    let Some(key) = read_length_prefixed_key(reader)? else {
        return Ok(None);
    };

    let mut vlen_buf = [0u8; 2];
    read_exact_or_corrupt(reader, &mut vlen_buf, "value length")?;
    let vlen = u16::from_le_bytes(vlen_buf);

    if vlen == TOMBSTONE_SENTINEL {
        return Ok(Some((key, Entry::Tombstone)));
    }

    let mut value = vec![0u8; vlen as usize];
    read_exact_or_corrupt(reader, &mut value, "value bytes")?;

    Ok(Some((key, Entry::Value(value))))
}

// =============================================================================
// Index Records
// =============================================================================

/// Encode one index record: `key_len | key | offset`
pub fn encode_key_offset(key: &[u8], offset: u64) -> Vec<u8> {
    let mut record = Vec::with_capacity(10 + key.len());
    record.extend_from_slice(&(key.len() as u16).to_le_bytes());
    record.extend_from_slice(key);
    record.extend_from_slice(&offset.to_le_bytes());
    record
}

/// Decode one index record, or `None` at a clean end of file
pub fn read_key_offset<R: Read>(reader: &mut R) -> Result<Option<(Vec<u8>, u64)>> {
    let Some(key) = read_length_prefixed_key(reader)? else {
        return Ok(None);
    };

    let mut offset_buf = [0u8; 8];
    read_exact_or_corrupt(reader, &mut offset_buf, "index offset")?;

    Ok(Some((key, u64::from_le_bytes(offset_buf))))
}

// =============================================================================
// Helpers
// =============================================================================

/// Read a `key_len | key` prefix; `None` means EOF at a record boundary
fn read_length_prefixed_key<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 2];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let key_len = u16::from_le_bytes(len_buf) as usize;

    let mut key = vec![0u8; key_len];
    read_exact_or_corrupt(reader, &mut key, "key bytes")?;

    Ok(Some(key))
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            KvError::Corruption(format!("disk table truncated while reading {what}"))
        } else {
            KvError::Io(e)
        }
    })
}
