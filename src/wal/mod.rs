//! Write-Ahead Log (WAL) Module
//!
//! Provides durability through append-only logging: every mutation is
//! framed, checksummed, and synced to the log before it touches the
//! memtable, so an interrupted process loses at most the record that
//! was being written when it died.
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Record 1                                      │
//! │ ┌───────────┬───────────┬───────────────────┐ │
//! │ │ Len (4)   │ CRC32 (4) │      Payload      │ │
//! │ └───────────┴───────────┴───────────────────┘ │
//! ├───────────────────────────────────────────────┤
//! │ Record 2                                      │
//! │ ┌───────────┬───────────┬───────────────────┐ │
//! │ │ Len (4)   │ CRC32 (4) │      Payload      │ │
//! │ └───────────┴───────────┴───────────────────┘ │
//! └───────────────────────────────────────────────┘
//! ```
//! All integers little-endian. The payload encodes one logical
//! operation:
//! ```text
//! ┌─────────────┬─────┬──────────────────────┬───────┐
//! │ key_len (2) │ key │ value_len_or_FFFF (2)│ value │
//! └─────────────┴─────┴──────────────────────┴───────┘
//! ```
//! where `0xFFFF` in the value-length slot marks a tombstone.

mod record;
mod recovery;
mod writer;

pub use record::{
    read_record, write_record, Operation, ReadRecord, MAX_RECORD_PAYLOAD, RECORD_HEADER_SIZE,
};
pub use recovery::{replay, ReplayStats};
pub use writer::WalWriter;

/// Name of the WAL file inside the engine directory
pub const WAL_FILE_NAME: &str = "wal.db";
