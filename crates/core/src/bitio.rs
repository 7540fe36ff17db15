//! Bit-level I/O for Huffman payloads.
//!
//! [`BitWriter`] and [`BitReader`] work MSB-first: the first bit written
//! lands in the most significant bit of the first byte.
//!
//! # Padding Rules
//! - BitWriter: pads the final partial byte with trailing zeros
//! - BitReader: cannot tell padding from data; the caller tracks how many
//!   symbols to decode
//!
//! # Phase
//!
//! A writer may start mid-byte. [`BitWriter::with_phase`] reserves `phase`
//! leading zero bits in the first byte so that a chunk rendered on its own
//! lines up with where it will sit in the final payload. [`splice`] then
//! joins such buffers with a single OR on the shared byte.
//!
//! # Example
//! ```
//! use huffpack_core::bitio::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//! let bytes = writer.finish();
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b11);
//! ```

use crate::error::{BitIoError, Result};
use crate::tree::Code;

/// Writes bits MSB-first into a byte buffer.
///
/// # Invariants
/// - `bit_count` is always < 8
/// - bits of `bit_buffer` below the `bit_count` most significant are zero
#[derive(Debug, Clone)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
    /// Leading zero bits reserved before the first written bit
    phase: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_buffer: 0,
            bit_count: 0,
            phase: 0,
        }
    }

    /// Writer whose first bit lands at position `phase` (0-7) of byte 0.
    ///
    /// # Errors
    /// `BitIoError::InvalidPhase` if `phase >= 8`.
    pub fn with_phase(phase: u8) -> Result<Self> {
        if phase >= 8 {
            return Err(BitIoError::InvalidPhase(phase).into());
        }
        Ok(Self {
            bytes: Vec::new(),
            bit_buffer: 0,
            bit_count: phase,
            phase,
        })
    }

    /// Writer with room for `bits` bits after the phase.
    pub fn with_capacity(phase: u8, bits: u64) -> Result<Self> {
        let mut writer = Self::with_phase(phase)?;
        writer.bytes.reserve(((bits + phase as u64 + 7) / 8) as usize);
        Ok(writer)
    }

    /// Write the low `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        while remaining > 0 {
            let room = 8 - self.bit_count as usize;
            let take = remaining.min(room);
            let shift = remaining - take;
            let bits = ((value >> shift) & ((1u64 << take) - 1)) as u8;

            self.bit_buffer |= bits << (room - take);
            self.bit_count += take as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }
            remaining -= take;
        }

        Ok(())
    }

    /// Append a Huffman code.
    pub fn write_code(&mut self, code: Code) -> Result<()> {
        let len = code.len();
        let bits = code.bits();
        if len > 64 {
            self.write_bits((bits >> 64) as u64, len - 64)?;
            self.write_bits(bits as u64, 64)
        } else {
            self.write_bits(bits as u64, len)
        }
    }

    /// Finish writing and return the output bytes, zero-padding the final
    /// partial byte.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
        }
        self.bytes
    }

    /// Bits written, not counting the reserved phase.
    pub fn bit_len(&self) -> u64 {
        self.bytes.len() as u64 * 8 + self.bit_count as u64 - self.phase as u64
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `chunk`, rendered with a writer of the given `phase`, to `out`.
///
/// `out` must end where `chunk` begins: when `phase` is non-zero its last
/// byte holds exactly `phase` real bits followed by zero padding, and the
/// chunk's first byte holds `phase` zero bits followed by its own. The two
/// bytes are merged with OR and the rest of the chunk is appended as-is.
pub fn splice(out: &mut Vec<u8>, phase: u8, chunk: &[u8]) {
    let Some((&first, rest)) = chunk.split_first() else {
        return;
    };
    if phase == 0 {
        out.extend_from_slice(chunk);
        return;
    }
    match out.last_mut() {
        Some(last) => *last |= first,
        None => out.push(first),
    }
    out.extend_from_slice(rest);
}

/// Reads bits MSB-first from a byte buffer.
///
/// # Invariants
/// - `bit_position` never exceeds `data.len() * 8`
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Current bit position (0 = MSB of first byte)
    bit_position: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_position: 0,
        }
    }

    /// Read up to 64 bits, first bit most significant in the result.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::UnexpectedEof` if not enough bits remain
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }
        if count as u64 > self.bits_remaining() {
            return Err(BitIoError::UnexpectedEof.into());
        }

        let mut result = 0u64;
        let mut remaining = count;
        while remaining > 0 {
            let byte = self.data[(self.bit_position / 8) as usize];
            let offset = (self.bit_position % 8) as usize;
            let available = 8 - offset;
            let take = remaining.min(available);

            let mask = ((1u16 << take) - 1) as u8;
            let bits = (byte >> (available - take)) & mask;
            result = (result << take) | bits as u64;

            self.bit_position += take as u64;
            remaining -= take;
        }

        Ok(result)
    }

    /// Read a single bit, or `None` at end of buffer.
    #[inline]
    pub fn next_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get((self.bit_position / 8) as usize)?;
        let bit = (byte >> (7 - self.bit_position % 8)) & 1 == 1;
        self.bit_position += 1;
        Some(bit)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        self.next_bit().ok_or_else(|| BitIoError::UnexpectedEof.into())
    }

    pub fn bits_remaining(&self) -> u64 {
        self.data.len() as u64 * 8 - self.bit_position
    }

    pub fn position(&self) -> u64 {
        self.bit_position
    }

    pub fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }
}
