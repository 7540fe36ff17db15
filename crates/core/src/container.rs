//! Compressed container serialization and parsing.
//!
//! A container is self-describing: it carries the original length, the
//! frequency table the decoder needs to rebuild the identical tree, and
//! the packed payload.
//!
//! # Container Format
//!
//! ```text
//! +----------------------+
//! | Magic (4 bytes)      |  "HUFP"
//! +----------------------+
//! | version (1)          |  1
//! +----------------------+
//! | flags (1)            |  reserved, 0
//! +----------------------+
//! | symbol_count (8)     |  u64 original byte length
//! +----------------------+
//! | entry_count (2)      |  u16 frequency entries, 0..=256
//! +----------------------+
//! | payload_len (8)      |  u64 payload bytes
//! +----------------------+
//! | crc32 (4)            |  u32 checksum
//! +----------------------+
//! | entries              |  entry_count * (symbol u8, frequency u64)
//! | (variable)           |  ascending symbol, frequency > 0
//! +----------------------+
//! | payload              |  MSB-first bits, last byte zero-padded
//! | (variable)           |
//! +----------------------+
//! ```
//!
//! All integers are little-endian.
//!
//! # CRC Coverage
//!
//! Every header field after the magic except the CRC itself, then the
//! entries and the payload.

use crate::error::{CorruptStreamError, Error, Result};
use crate::frequency::FrequencyTable;
use crate::source::ByteSink;
use crate::tree::HuffmanTree;

/// Magic number for containers: "HUFP"
pub const MAGIC: [u8; 4] = *b"HUFP";

pub const VERSION: u8 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 28;

/// Size of one (symbol, frequency) entry
const ENTRY_SIZE: usize = 9;

/// Byte range of the header covered by the CRC
const CRC_COVERED_HEADER: std::ops::Range<usize> = 4..24;

/// A compressed stream: header fields plus packed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedContainer {
    /// Number of original bytes
    pub symbol_count: u64,

    /// Frequencies the decoding tree is rebuilt from
    pub frequencies: FrequencyTable,

    /// Packed payload bits
    pub payload: Vec<u8>,
}

impl CompressedContainer {
    /// The container for a zero-length input.
    pub fn empty() -> Self {
        Self {
            symbol_count: 0,
            frequencies: FrequencyTable::new(),
            payload: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_count == 0
    }

    /// Size of the serialized container in bytes.
    pub fn serialized_len(&self) -> usize {
        HEADER_SIZE + ENTRY_SIZE * self.frequencies.distinct() + self.payload.len()
    }

    /// Rebuild the decoding tree, or `None` for an empty container.
    ///
    /// # Errors
    /// `Error::CorruptStream` if the frequency table cannot form a tree.
    pub fn tree(&self) -> Result<Option<HuffmanTree>> {
        if self.frequencies.is_empty() {
            return Ok(None);
        }
        HuffmanTree::from_frequencies(&self.frequencies)
            .map(Some)
            .map_err(Error::into_corrupt)
    }

    /// Header and frequency entries, with the CRC filled in.
    fn header_bytes(&self) -> Vec<u8> {
        let entry_count = self.frequencies.distinct();
        let mut head = Vec::with_capacity(HEADER_SIZE + ENTRY_SIZE * entry_count);

        head.extend_from_slice(&MAGIC);
        head.push(VERSION);
        head.push(0);
        head.extend_from_slice(&self.symbol_count.to_le_bytes());
        head.extend_from_slice(&(entry_count as u16).to_le_bytes());
        head.extend_from_slice(&(self.payload.len() as u64).to_le_bytes());
        head.extend_from_slice(&[0; 4]);

        for (symbol, count) in self.frequencies.iter() {
            head.push(symbol);
            head.extend_from_slice(&count.to_le_bytes());
        }

        let crc = compute_crc(&head, &self.payload);
        head[24..28].copy_from_slice(&crc.to_le_bytes());
        head
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header_bytes();
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Serialize into `sink` without copying the payload.
    pub fn write_to<K: ByteSink + ?Sized>(&self, sink: &mut K) -> Result<()> {
        sink.append(&self.header_bytes())?;
        sink.append(&self.payload)
    }

    /// Parse and verify the CRC.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        parse(bytes, true)
    }

    /// Parse without checking the CRC. Structural checks still apply.
    pub fn from_bytes_unchecked(bytes: &[u8]) -> Result<Self> {
        parse(bytes, false)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[at..at + 2]);
    u16::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

fn parse(bytes: &[u8], verify: bool) -> Result<CompressedContainer> {
    if bytes.len() < HEADER_SIZE {
        return Err(CorruptStreamError::TooShort {
            required: HEADER_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[0..4]);
    if magic != MAGIC {
        return Err(CorruptStreamError::InvalidMagic {
            expected: MAGIC,
            actual: magic,
        }
        .into());
    }

    let version = bytes[4];
    if version != VERSION {
        return Err(CorruptStreamError::UnsupportedVersion(version).into());
    }

    let symbol_count = read_u64(bytes, 6);
    let entry_count = read_u16(bytes, 14) as usize;
    let payload_len = read_u64(bytes, 16);
    let crc32 = read_u32(bytes, 24);

    if entry_count > 256 {
        return Err(CorruptStreamError::InvalidFrequencyTable(format!(
            "{entry_count} entries for a 256-symbol alphabet"
        ))
        .into());
    }

    let entries_end = HEADER_SIZE + ENTRY_SIZE * entry_count;
    let expected_len = (entries_end as u64).checked_add(payload_len);
    if expected_len != Some(bytes.len() as u64) {
        return Err(CorruptStreamError::LengthMismatch {
            expected: expected_len.unwrap_or(u64::MAX),
            actual: bytes.len() as u64,
        }
        .into());
    }

    if verify {
        let actual = compute_crc(&bytes[..entries_end], &bytes[entries_end..]);
        if actual != crc32 {
            return Err(CorruptStreamError::Checksum {
                expected: crc32,
                actual,
            }
            .into());
        }
    }

    let mut counts = [0u64; 256];
    let mut previous: Option<u8> = None;
    for entry in bytes[HEADER_SIZE..entries_end].chunks_exact(ENTRY_SIZE) {
        let symbol = entry[0];
        let count = read_u64(entry, 1);
        if previous.is_some_and(|p| p >= symbol) {
            return Err(CorruptStreamError::InvalidFrequencyTable(format!(
                "symbol {symbol:#04x} out of order"
            ))
            .into());
        }
        if count == 0 {
            return Err(CorruptStreamError::InvalidFrequencyTable(format!(
                "zero frequency for symbol {symbol:#04x}"
            ))
            .into());
        }
        counts[symbol as usize] = count;
        previous = Some(symbol);
    }

    if symbol_count > 0 && entry_count == 0 {
        return Err(CorruptStreamError::InvalidFrequencyTable(format!(
            "{symbol_count} symbols declared with no frequency entries"
        ))
        .into());
    }

    Ok(CompressedContainer {
        symbol_count,
        frequencies: FrequencyTable::from_counts(counts),
        payload: bytes[entries_end..].to_vec(),
    })
}

/// CRC32 over the protected fields. `head` is the header plus entries with
/// any value in the CRC slot.
fn compute_crc(head: &[u8], payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&head[CRC_COVERED_HEADER]);
    hasher.update(&head[HEADER_SIZE..]);
    hasher.update(payload);
    hasher.finalize()
}
