//! WAL record framing and operation payload codec
//!
//! Framing is `len | crc32 | payload`; the decoder is deliberately
//! tolerant at the tail of the stream, because the last record of a
//! crashed process is routinely incomplete and must stop replay rather
//! than abort it.

use std::io::{Read, Write};

use crate::config::{MAX_KEY_SIZE, MAX_VALUE_SIZE};
use crate::error::{KvError, Result};
use crate::memtable::Entry;

/// Framing header size: 4 bytes length + 4 bytes CRC32
pub const RECORD_HEADER_SIZE: usize = 8;

/// Largest payload a record can legally carry: two length prefixes plus
/// a maximal key and value. Length fields above this are corruption and
/// must be rejected before the allocation they would demand.
pub const MAX_RECORD_PAYLOAD: usize = 2 + MAX_KEY_SIZE + 2 + MAX_VALUE_SIZE;

/// Value-length slot marking a tombstone in an operation payload
pub(crate) const TOMBSTONE_SENTINEL: u16 = u16::MAX;

// =============================================================================
// Operations
// =============================================================================

/// A logical operation carried by one WAL record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Operation {
    /// Serialize the operation into a record payload
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Operation::Put { key, value } => {
                let mut payload = Vec::with_capacity(4 + key.len() + value.len());
                payload.extend_from_slice(&(key.len() as u16).to_le_bytes());
                payload.extend_from_slice(key);
                payload.extend_from_slice(&(value.len() as u16).to_le_bytes());
                payload.extend_from_slice(value);
                payload
            }
            Operation::Delete { key } => {
                let mut payload = Vec::with_capacity(4 + key.len());
                payload.extend_from_slice(&(key.len() as u16).to_le_bytes());
                payload.extend_from_slice(key);
                payload.extend_from_slice(&TOMBSTONE_SENTINEL.to_le_bytes());
                payload
            }
        }
    }

    /// Parse an operation from a record payload.
    ///
    /// The payload's checksum has already been verified, so a malformed
    /// layout here is corruption, not a torn write.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < 2 {
            return Err(KvError::Corruption(
                "operation payload shorter than key length field".to_string(),
            ));
        }
        let key_len = u16::from_le_bytes([payload[0], payload[1]]) as usize;

        if payload.len() < 2 + key_len + 2 {
            return Err(KvError::Corruption(format!(
                "operation payload truncated: key_len {} in {} payload bytes",
                key_len,
                payload.len()
            )));
        }
        let key = payload[2..2 + key_len].to_vec();

        let vlen_pos = 2 + key_len;
        let vlen = u16::from_le_bytes([payload[vlen_pos], payload[vlen_pos + 1]]);

        if vlen == TOMBSTONE_SENTINEL {
            if payload.len() != vlen_pos + 2 {
                return Err(KvError::Corruption(
                    "trailing bytes after tombstone marker".to_string(),
                ));
            }
            return Ok(Operation::Delete { key });
        }

        let value_start = vlen_pos + 2;
        if payload.len() != value_start + vlen as usize {
            return Err(KvError::Corruption(format!(
                "operation payload length mismatch: value_len {} in {} payload bytes",
                vlen,
                payload.len()
            )));
        }
        let value = payload[value_start..].to_vec();

        Ok(Operation::Put { key, value })
    }

    /// View the operation as a key plus memtable entry
    pub fn into_entry(self) -> (Vec<u8>, Entry) {
        match self {
            Operation::Put { key, value } => (key, Entry::Value(value)),
            Operation::Delete { key } => (key, Entry::Tombstone),
        }
    }
}

// =============================================================================
// Record Framing
// =============================================================================

/// Write one framed record: `len | crc32(payload) | payload`.
///
/// The frame is assembled in memory and handed to the writer in a
/// single call, so a crashed write leaves at most one torn record.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let checksum = crc32fast::hash(payload);

    let mut frame = Vec::with_capacity(RECORD_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame.extend_from_slice(payload);

    writer.write_all(&frame)?;
    Ok(())
}

/// Outcome of reading one framed record
#[derive(Debug, PartialEq, Eq)]
pub enum ReadRecord {
    /// A complete record with a verified checksum
    Record(Vec<u8>),

    /// Clean end of stream at a record boundary
    Eof,

    /// The stream ended mid-record: the crash tail
    Torn,

    /// A complete record whose checksum did not match its payload
    Corrupt { stored: u32, computed: u32 },

    /// A length field larger than any encodable payload
    Oversized { len: u32 },
}

/// Read one framed record.
///
/// End-of-stream at a record boundary is the expected termination, not
/// an error. A short read inside a record or a checksum mismatch stops
/// replay at that point; every earlier record stays valid.
pub fn read_record<R: Read>(reader: &mut R) -> Result<ReadRecord> {
    let mut len_buf = [0u8; 4];
    match read_up_to(reader, &mut len_buf)? {
        0 => return Ok(ReadRecord::Eof),
        4 => {}
        _ => return Ok(ReadRecord::Torn),
    }
    let len = u32::from_le_bytes(len_buf);
    if len as usize > MAX_RECORD_PAYLOAD {
        return Ok(ReadRecord::Oversized { len });
    }
    let len = len as usize;

    let mut crc_buf = [0u8; 4];
    if read_up_to(reader, &mut crc_buf)? != 4 {
        return Ok(ReadRecord::Torn);
    }
    let stored = u32::from_le_bytes(crc_buf);

    let mut payload = vec![0u8; len];
    if read_up_to(reader, &mut payload)? != len {
        return Ok(ReadRecord::Torn);
    }

    let computed = crc32fast::hash(&payload);
    if computed != stored {
        return Ok(ReadRecord::Corrupt { stored, computed });
    }

    Ok(ReadRecord::Record(payload))
}

/// Fill `buf` as far as the stream allows, returning the bytes read.
///
/// Unlike `read_exact`, a short read is reported by count instead of an
/// error, which lets the caller tell a clean EOF from a torn record.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
