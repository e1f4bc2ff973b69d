//! Compaction: k-way merge of disk-table generations
//!
//! Merges several generations into one, keeping for each duplicate key
//! the entry from the newest generation in the merge set. Tombstones
//! are dropped only when no generation older than the merge set
//! remains; otherwise the dropped marker would resurrect a stale value
//! from an untouched older generation.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::memtable::Entry;
use crate::table::{self, format, DiskTableWriter};

/// Merge the generations in `sources` (ordered newest first) into a new
/// generation `output_index` inside `dir`.
///
/// The output is written with the ordinary disk-table writer, so it
/// carries the same three-file shape as a flushed generation. The
/// sources' files are left in place; the caller deletes them only after
/// the new generation is registered.
pub fn compact(
    dir: &Path,
    sources: &[u64],
    output_index: u64,
    sparse_key_distance: usize,
    drop_tombstones: bool,
) -> Result<()> {
    let mut streams = Vec::with_capacity(sources.len());
    for &source in sources {
        streams.push(TableStream::open(dir, source)?);
    }

    let mut writer = DiskTableWriter::new(dir, output_index, sparse_key_distance)?;
    let mut heap = BinaryHeap::with_capacity(streams.len());

    // Rank = position in `sources`, so rank 0 is the newest generation.
    for (rank, stream) in streams.iter().enumerate() {
        if let Some(key) = stream.current_key() {
            heap.push(MergePoint { key: key.to_vec(), rank });
        }
    }

    let mut merged = 0u64;
    let mut dropped = 0u64;

    while let Some(point) = heap.pop() {
        // The newest generation holding this key wins.
        let (key, entry) = streams[point.rank].take()?;
        if let Some(next_key) = streams[point.rank].current_key() {
            heap.push(MergePoint { key: next_key.to_vec(), rank: point.rank });
        }

        // Discard the same key from every older generation in the set.
        while heap.peek().is_some_and(|p| p.key == key) {
            let stale = heap.pop().unwrap();
            streams[stale.rank].take()?;
            if let Some(next_key) = streams[stale.rank].current_key() {
                heap.push(MergePoint { key: next_key.to_vec(), rank: stale.rank });
            }
        }

        if drop_tombstones && entry == Entry::Tombstone {
            dropped += 1;
            continue;
        }

        writer.write(&key, &entry)?;
        merged += 1;
    }

    writer.finish()?;

    debug!(
        sources = ?sources,
        output = output_index,
        merged,
        tombstones_dropped = dropped,
        "compaction merge complete"
    );

    Ok(())
}

/// Sequential cursor over one source generation's data file
struct TableStream {
    generation: u64,
    reader: BufReader<File>,
    current: Option<(Vec<u8>, Entry)>,
}

impl TableStream {
    fn open(dir: &Path, generation: u64) -> Result<Self> {
        let mut reader = BufReader::new(File::open(table::data_path(dir, generation))?);
        let current = format::read_entry(&mut reader)?;
        Ok(Self {
            generation,
            reader,
            current,
        })
    }

    fn current_key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(key, _)| key.as_slice())
    }

    /// Yield the current entry and advance to the next one
    fn take(&mut self) -> Result<(Vec<u8>, Entry)> {
        let entry = self
            .current
            .take()
            .unwrap_or_else(|| unreachable!("take on exhausted stream {}", self.generation));
        self.current = format::read_entry(&mut self.reader)?;
        Ok(entry)
    }
}

/// Heap key for the k-way merge.
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed: the
/// smallest key wins, and within a key the lowest rank (newest
/// generation) wins.
struct MergePoint {
    key: Vec<u8>,
    rank: usize,
}

impl PartialEq for MergePoint {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.rank == other.rank
    }
}

impl Eq for MergePoint {}

impl Ord for MergePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        (&other.key, other.rank).cmp(&(&self.key, self.rank))
    }
}

impl PartialOrd for MergePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
