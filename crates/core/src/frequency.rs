//! Byte frequency counting.
//!
//! [`FrequencyCounter`] counts how often each of the 256 byte values occurs
//! over a range of a [`ByteSource`]. The parallel path splits the range at
//! its midpoint until sub-ranges fall under the chunk threshold, counts the
//! leaves on the rayon pool, and merges the per-task tables by element-wise
//! addition on the way back up. Addition is commutative and associative, so
//! the result is identical to a sequential scan however the range is split.

use crate::config::CodecConfig;
use crate::error::Result;
use crate::source::ByteSource;
use std::fmt;
use std::ops::Range;

/// Default split threshold in bytes.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 1000;

/// Occurrence count for each byte value.
///
/// Invariant: `total()` equals the number of bytes counted into the table.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    /// All-zero table.
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    pub fn from_counts(counts: [u64; 256]) -> Self {
        Self { counts }
    }

    /// Count every byte of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = Self::new();
        table.add_bytes(bytes);
        table
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.counts[byte as usize] += 1;
        }
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn counts(&self) -> &[u64; 256] {
        &self.counts
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Number of symbols with a non-zero count.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Non-zero entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }

    /// Element-wise add `other` into `self`. Counts saturate at `u64::MAX`.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(s, c)| (format!("{s:#04x}"), c)))
            .finish()
    }
}

/// Repeated symbols are summed; counts saturate at `u64::MAX`.
impl FromIterator<(u8, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (u8, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (symbol, count) in iter {
            let slot = &mut table.counts[symbol as usize];
            *slot = slot.saturating_add(count);
        }
        table
    }
}

/// Split `[start, end)` at midpoints until every piece is at most
/// `threshold` bytes long. Pieces are returned in index order.
///
/// An empty range yields no pieces.
pub fn partition(start: u64, end: u64, threshold: usize) -> Vec<Range<u64>> {
    let mut out = Vec::new();
    if start < end {
        split_into(start, end, threshold.max(1) as u64, &mut out);
    }
    out
}

fn split_into(start: u64, end: u64, threshold: u64, out: &mut Vec<Range<u64>>) {
    if end - start <= threshold {
        out.push(start..end);
        return;
    }
    let mid = start + (end - start) / 2;
    split_into(start, mid, threshold, out);
    split_into(mid, end, threshold, out);
}

/// Counts byte frequencies over a [`ByteSource`].
#[derive(Debug, Clone)]
pub struct FrequencyCounter {
    chunk_threshold: usize,
    read_block: usize,
    parallel: bool,
}

impl FrequencyCounter {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            chunk_threshold: config.chunk_threshold.max(1),
            read_block: config.read_block.max(1),
            parallel: config.parallel,
        }
    }

    /// Count the whole source.
    pub fn count<S: ByteSource + ?Sized>(&self, source: &S) -> Result<FrequencyTable> {
        self.count_range(source, 0, source.length())
    }

    /// Count `[start, end)` of the source.
    ///
    /// # Errors
    /// `Error::Io` if any part of the range cannot be read. No partial
    /// table is returned.
    pub fn count_range<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        start: u64,
        end: u64,
    ) -> Result<FrequencyTable> {
        let table = if self.parallel {
            self.count_parallel(source, start, end)?
        } else {
            self.count_sequential(source, start, end)?
        };
        tracing::debug!(
            start,
            end,
            distinct = table.distinct(),
            parallel = self.parallel,
            "frequency count finished"
        );
        Ok(table)
    }

    /// Single pass over the range, reading `read_block` bytes at a time.
    pub fn count_sequential<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        start: u64,
        end: u64,
    ) -> Result<FrequencyTable> {
        let mut table = FrequencyTable::new();
        let mut pos = start;
        while pos < end {
            let next = end.min(pos + self.read_block as u64);
            table.add_bytes(&source.read(pos, next)?);
            pos = next;
        }
        Ok(table)
    }

    /// Divide-and-conquer count on the rayon pool.
    pub fn count_parallel<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        start: u64,
        end: u64,
    ) -> Result<FrequencyTable> {
        if end <= start {
            return Ok(FrequencyTable::new());
        }
        if end - start <= self.chunk_threshold as u64 {
            return Ok(FrequencyTable::from_bytes(&source.read(start, end)?));
        }

        let mid = start + (end - start) / 2;
        let (left, right) = rayon::join(
            || self.count_parallel(source, start, mid),
            || self.count_parallel(source, mid, end),
        );
        let mut table = left?;
        table.merge(&right?);
        Ok(table)
    }
}
