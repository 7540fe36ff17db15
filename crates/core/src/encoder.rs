//! Bit-exact payload encoding.
//!
//! Codes are packed MSB-first across byte boundaries with no per-chunk
//! alignment; only the very last byte of the payload carries zero padding.
//!
//! The parallel path encodes chunks independently and still produces the
//! exact bytes of the sequential path:
//!
//! 1. partition the source with the same midpoint split the counter uses
//! 2. compute each chunk's bit length in parallel
//! 3. exclusive prefix sum of the lengths gives each chunk's start offset
//! 4. render each chunk in parallel into a writer whose phase is
//!    `offset % 8`, so its bits sit where they will in the final payload
//! 5. splice the buffers in index order, OR-ing the one shared byte at each
//!    seam
//!
//! The seam cost is one byte per chunk, so stitching is linear in the
//! output size.

use crate::bitio::{splice, BitWriter};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::frequency::partition;
use crate::source::ByteSource;
use crate::tree::{Code, CodeTable};
use rayon::prelude::*;
use std::io;
use std::ops::Range;

/// Output of an encoding pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Packed bits, final byte zero-padded
    pub bytes: Vec<u8>,
    /// Exact number of meaningful bits in `bytes`
    pub bit_len: u64,
    /// Number of source bytes encoded
    pub symbol_count: u64,
    /// Number of chunks the source was split into (1 when sequential)
    pub chunks: usize,
}

/// Encodes a byte source against a fixed code table.
#[derive(Debug, Clone)]
pub struct BitstreamEncoder<'t> {
    codes: &'t CodeTable,
    chunk_threshold: usize,
    read_block: usize,
    parallel: bool,
}

impl<'t> BitstreamEncoder<'t> {
    pub fn new(codes: &'t CodeTable, config: &CodecConfig) -> Self {
        Self {
            codes,
            chunk_threshold: config.chunk_threshold.max(1),
            read_block: config.read_block.max(1),
            parallel: config.parallel,
        }
    }

    /// Encode the whole source.
    ///
    /// # Errors
    /// - `Error::UnknownSymbol` if a source byte has no code
    /// - `Error::Io` if the source cannot be read
    pub fn encode<S: ByteSource + ?Sized>(&self, source: &S) -> Result<EncodedPayload> {
        let payload = if self.parallel {
            self.encode_parallel(source)?
        } else {
            self.encode_sequential(source)?
        };
        tracing::debug!(
            symbols = payload.symbol_count,
            bits = payload.bit_len,
            bytes = payload.bytes.len(),
            chunks = payload.chunks,
            "payload encoded"
        );
        Ok(payload)
    }

    #[inline]
    fn code_for(&self, symbol: u8, offset: u64) -> Result<Code> {
        self.codes
            .get(symbol)
            .ok_or(Error::UnknownSymbol { symbol, offset })
    }

    /// One accumulator over the whole source.
    pub fn encode_sequential<S: ByteSource + ?Sized>(&self, source: &S) -> Result<EncodedPayload> {
        let len = source.length();
        let mut writer = BitWriter::new();
        let mut pos = 0u64;
        while pos < len {
            let next = len.min(pos + self.read_block as u64);
            let block = source.read(pos, next)?;
            for (i, &byte) in block.iter().enumerate() {
                writer.write_code(self.code_for(byte, pos + i as u64)?)?;
            }
            pos = next;
        }

        let bit_len = writer.bit_len();
        Ok(EncodedPayload {
            bytes: writer.finish(),
            bit_len,
            symbol_count: len,
            chunks: usize::from(len > 0),
        })
    }

    /// Chunked encoding on the rayon pool. Output is identical to
    /// [`encode_sequential`](Self::encode_sequential).
    pub fn encode_parallel<S: ByteSource + ?Sized>(&self, source: &S) -> Result<EncodedPayload> {
        let len = source.length();
        let chunks = partition(0, len, self.chunk_threshold);

        let lengths: Vec<u64> = chunks
            .par_iter()
            .map(|range| self.chunk_bit_length(source, range))
            .collect::<Result<_>>()?;

        let mut offsets = Vec::with_capacity(lengths.len());
        let mut total = 0u64;
        for &bits in &lengths {
            offsets.push(total);
            total += bits;
        }

        let rendered: Vec<Vec<u8>> = chunks
            .par_iter()
            .zip(offsets.par_iter().zip(lengths.par_iter()))
            .map(|(range, (&offset, &bits))| {
                self.render_chunk(source, range, (offset % 8) as u8, bits)
            })
            .collect::<Result<_>>()?;

        let mut bytes = Vec::with_capacity(total.div_ceil(8) as usize);
        for (buf, &offset) in rendered.iter().zip(&offsets) {
            splice(&mut bytes, (offset % 8) as u8, buf);
        }
        Ok(EncodedPayload {
            bytes,
            bit_len: total,
            symbol_count: len,
            chunks: chunks.len(),
        })
    }

    /// Sum of code lengths over one chunk.
    fn chunk_bit_length<S: ByteSource + ?Sized>(&self, source: &S, range: &Range<u64>) -> Result<u64> {
        let data = source.read(range.start, range.end)?;
        data.iter().enumerate().try_fold(0u64, |acc, (i, &byte)| -> Result<u64> {
            let code = self.code_for(byte, range.start + i as u64)?;
            Ok(acc + code.len() as u64)
        })
    }

    /// Render one chunk starting at bit `phase` of its first byte.
    ///
    /// # Errors
    /// `Error::Io` if the rendered length differs from `bits`, which means
    /// the source changed between the two passes.
    fn render_chunk<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        range: &Range<u64>,
        phase: u8,
        bits: u64,
    ) -> Result<Vec<u8>> {
        let data = source.read(range.start, range.end)?;
        let mut writer = BitWriter::with_capacity(phase, bits)?;
        for (i, &byte) in data.iter().enumerate() {
            writer.write_code(self.code_for(byte, range.start + i as u64)?)?;
        }
        if writer.bit_len() != bits {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "bytes {}..{} changed while encoding: {} bits measured, {} rendered",
                    range.start,
                    range.end,
                    bits,
                    writer.bit_len()
                ),
            )));
        }
        tracing::trace!(start = range.start, end = range.end, phase, bits, "chunk rendered");
        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::frequency::FrequencyTable;
    use crate::tree::HuffmanTree;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tree_for(data: &[u8]) -> HuffmanTree {
        HuffmanTree::from_frequencies(&FrequencyTable::from_bytes(data)).unwrap()
    }

    fn config(threshold: usize, parallel: bool) -> CodecConfig {
        CodecConfig::default()
            .with_chunk_threshold(threshold)
            .with_parallel(parallel)
    }

    #[test]
    fn test_single_symbol_payload_size() {
        let data = vec![0x41u8; 1000];
        let tree = tree_for(&data);
        for parallel in [false, true] {
            let payload = BitstreamEncoder::new(tree.code_table(), &config(1000, parallel))
                .encode(&data)
                .unwrap();
            assert_eq!(payload.bit_len, 1000);
            assert_eq!(payload.bytes.len(), 125);
            assert!(payload.bytes.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_known_bits() {
        // a=00 b=01 c=1
        let freqs: FrequencyTable = [(b'a', 1), (b'b', 1), (b'c', 2)].into_iter().collect();
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        let data = b"cabc".to_vec();
        let payload = BitstreamEncoder::new(tree.code_table(), &config(1, false))
            .encode(&data)
            .unwrap();
        // 1 00 01 1 -> 1000_1100
        assert_eq!(payload.bytes, vec![0b1000_1100]);
        assert_eq!(payload.bit_len, 6);
        assert_eq!(payload.symbol_count, 4);
    }

    #[test]
    fn test_parallel_matches_sequential_all_thresholds() {
        let data: Vec<u8> = (0..5000u32)
            .map(|i| match i % 11 {
                0..=5 => b'e',
                6..=8 => b't',
                9 => (i % 97) as u8,
                _ => b' ',
            })
            .collect();
        let tree = tree_for(&data);
        let expected = BitstreamEncoder::new(tree.code_table(), &config(1000, false))
            .encode(&data)
            .unwrap();

        for threshold in [1, 2, 3, 7, 8, 9, 13, 100, 999, 1000, 5000, 10_000] {
            let got = BitstreamEncoder::new(tree.code_table(), &config(threshold, true))
                .encode(&data)
                .unwrap();
            assert_eq!(got.bytes, expected.bytes, "threshold {threshold}");
            assert_eq!(got.bit_len, expected.bit_len);
        }
    }

    #[test]
    fn test_unknown_symbol() {
        let tree = tree_for(b"aaab");
        let data = b"abacab".to_vec();
        for parallel in [false, true] {
            let err = BitstreamEncoder::new(tree.code_table(), &config(2, parallel))
                .encode(&data)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
            assert!(matches!(err, Error::UnknownSymbol { symbol: b'c', offset: 3 }));
        }
    }

    #[test]
    fn test_empty_source() {
        let tree = tree_for(b"x");
        let data: Vec<u8> = Vec::new();
        for parallel in [false, true] {
            let payload = BitstreamEncoder::new(tree.code_table(), &config(4, parallel))
                .encode(&data)
                .unwrap();
            assert!(payload.bytes.is_empty());
            assert_eq!(payload.bit_len, 0);
            assert_eq!(payload.chunks, 0);
        }
    }

    #[test]
    fn test_bit_length_matches_table() {
        let data = b"mississippi river banks".to_vec();
        let freqs = FrequencyTable::from_bytes(&data);
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        let payload = BitstreamEncoder::new(tree.code_table(), &config(3, true))
            .encode(&data)
            .unwrap();
        assert_eq!(Some(payload.bit_len), tree.code_table().encoded_bit_length(&freqs));
        assert_eq!(payload.bytes.len() as u64, payload.bit_len.div_ceil(8));
    }

    /// Serves `a` for the first `stable_reads` reads and `c` afterwards.
    struct ShiftingSource {
        len: u64,
        stable_reads: usize,
        reads: AtomicUsize,
    }

    impl ByteSource for ShiftingSource {
        fn length(&self) -> u64 {
            self.len
        }

        fn read(&self, start: u64, end: u64) -> Result<Cow<'_, [u8]>> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            let byte = if n < self.stable_reads { b'a' } else { b'c' };
            Ok(Cow::Owned(vec![byte; (end - start) as usize]))
        }
    }

    #[test]
    fn test_source_changed_between_passes() {
        // a=00 c=1: the render pass sees shorter codes than the length pass
        let freqs: FrequencyTable = [(b'a', 1), (b'b', 1), (b'c', 2)].into_iter().collect();
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        let source = ShiftingSource {
            len: 8,
            stable_reads: 2,
            reads: AtomicUsize::new(0),
        };
        let err = BitstreamEncoder::new(tree.code_table(), &config(4, true))
            .encode(&source)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
