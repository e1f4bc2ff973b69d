//! WAL Recovery
//!
//! Rebuilds the memtable by replaying the WAL sequentially at open
//! time. Replay stops silently at the first torn or corrupt record:
//! everything before it is kept, the tail is abandoned. Lost writes are
//! bounded to the record(s) that never finished reaching the disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::memtable::{Entry, MemTable};

use super::record::{read_record, Operation, ReadRecord};

/// Statistics from one replay pass
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayStats {
    /// Number of records applied to the memtable
    pub records_applied: u64,

    /// The stream ended mid-record (normal after a crash)
    pub torn_tail: bool,

    /// A record failed checksum verification
    pub corrupt_tail: bool,
}

/// Replay a WAL file into a fresh memtable.
///
/// A missing file yields an empty memtable; the engine creates the WAL
/// on first append.
pub fn replay(path: &Path) -> Result<(MemTable, ReplayStats)> {
    let memtable = MemTable::new();
    let mut stats = ReplayStats::default();

    if !path.exists() {
        return Ok((memtable, stats));
    }

    let mut reader = BufReader::new(File::open(path)?);

    loop {
        match read_record(&mut reader)? {
            ReadRecord::Record(payload) => {
                let operation = match Operation::decode(&payload) {
                    Ok(op) => op,
                    Err(e) => {
                        // Checksum passed but the layout is bad; treat it
                        // like any other corrupt tail and keep what we have.
                        warn!(
                            path = %path.display(),
                            records_applied = stats.records_applied,
                            error = %e,
                            "undecodable WAL payload; stopping replay"
                        );
                        stats.corrupt_tail = true;
                        break;
                    }
                };
                let (key, entry) = operation.into_entry();
                match entry {
                    Entry::Value(value) => {
                        memtable.put(&key, value);
                    }
                    Entry::Tombstone => {
                        memtable.delete(&key);
                    }
                }
                stats.records_applied += 1;
            }
            ReadRecord::Eof => break,
            ReadRecord::Torn => {
                warn!(
                    path = %path.display(),
                    records_applied = stats.records_applied,
                    "WAL ends mid-record; dropping torn tail"
                );
                stats.torn_tail = true;
                break;
            }
            ReadRecord::Corrupt { stored, computed } => {
                warn!(
                    path = %path.display(),
                    records_applied = stats.records_applied,
                    stored, computed,
                    "WAL checksum mismatch; stopping replay"
                );
                stats.corrupt_tail = true;
                break;
            }
            ReadRecord::Oversized { len } => {
                warn!(
                    path = %path.display(),
                    records_applied = stats.records_applied,
                    len,
                    "WAL length field exceeds maximum payload; stopping replay"
                );
                stats.corrupt_tail = true;
                break;
            }
        }
    }

    debug!(
        path = %path.display(),
        records_applied = stats.records_applied,
        entries = memtable.len(),
        "WAL replay complete"
    );

    Ok((memtable, stats))
}
