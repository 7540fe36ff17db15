//! Payload decoding by walking the Huffman tree.
//!
//! Starting at the root, each payload bit selects the left (`0`) or right
//! (`1`) child. Reaching a leaf emits its symbol and restarts at the root.
//! Decoding stops after exactly the declared number of symbols; whatever
//! remains of the final byte is padding and is ignored.
//!
//! Output reaches the sink only once the whole payload has decoded and
//! passed its length checks. A failed decode leaves the sink untouched.

use crate::bitio::BitReader;
use crate::error::{CorruptStreamError, Result};
use crate::source::ByteSink;
use crate::tree::{HuffmanTree, Node};

/// Decodes payloads produced against a given tree.
#[derive(Debug, Clone, Copy)]
pub struct BitstreamDecoder<'t> {
    tree: &'t HuffmanTree,
}

impl<'t> BitstreamDecoder<'t> {
    pub fn new(tree: &'t HuffmanTree) -> Self {
        Self { tree }
    }

    /// Decode `symbol_count` symbols from `payload`.
    ///
    /// # Errors
    /// - `CorruptStreamError::PayloadExhausted` if bits run out first
    /// - `CorruptStreamError::InvalidCode` if a bit sequence leaves the tree
    /// - `CorruptStreamError::TrailingData` if a whole unused byte remains
    pub fn decode(&self, payload: &[u8], symbol_count: u64) -> Result<Vec<u8>> {
        self.decode_counted(payload, symbol_count).map(|(out, _)| out)
    }

    /// Decode `symbol_count` symbols from `payload` and append them to
    /// `sink` in one call.
    ///
    /// Returns the number of payload bits consumed. Errors are those of
    /// [`decode`](Self::decode); on error nothing is appended.
    pub fn decode_into<K: ByteSink + ?Sized>(
        &self,
        payload: &[u8],
        symbol_count: u64,
        sink: &mut K,
    ) -> Result<u64> {
        let (out, bits) = self.decode_counted(payload, symbol_count)?;
        sink.append(&out)?;
        Ok(bits)
    }

    fn decode_counted(&self, payload: &[u8], symbol_count: u64) -> Result<(Vec<u8>, u64)> {
        let mut reader = BitReader::new(payload);
        // every symbol costs at least one bit
        let hint = symbol_count.min(payload.len() as u64 * 8) as usize;
        let mut out = Vec::with_capacity(hint);

        for decoded in 0..symbol_count {
            out.push(self.next_symbol(&mut reader, decoded, symbol_count)?);
        }

        let extra_bits = reader.bits_remaining();
        if extra_bits >= 8 {
            return Err(CorruptStreamError::TrailingData { extra_bits }.into());
        }

        tracing::debug!(symbols = symbol_count, bits = reader.position(), "payload decoded");
        Ok((out, reader.position()))
    }

    fn next_symbol(&self, reader: &mut BitReader<'_>, decoded: u64, expected: u64) -> Result<u8> {
        let nodes = self.tree.nodes();
        let mut id = self.tree.root();

        // single-symbol alphabet: the code is the one bit `0`
        if let Some(&Node::Leaf { symbol, .. }) = nodes.get(id) {
            let position = reader.position();
            return match reader.next_bit() {
                Some(false) => Ok(symbol),
                Some(true) => Err(CorruptStreamError::InvalidCode { position }.into()),
                None => Err(CorruptStreamError::PayloadExhausted { decoded, expected }.into()),
            };
        }

        loop {
            let position = reader.position();
            let bit = reader
                .next_bit()
                .ok_or(CorruptStreamError::PayloadExhausted { decoded, expected })?;
            id = match nodes.get(id) {
                Some(&Node::Internal { left, right, .. }) => {
                    if bit {
                        right
                    } else {
                        left
                    }
                }
                _ => return Err(CorruptStreamError::InvalidCode { position }.into()),
            };
            match nodes.get(id) {
                Some(&Node::Leaf { symbol, .. }) => return Ok(symbol),
                Some(Node::Internal { .. }) => continue,
                None => return Err(CorruptStreamError::InvalidCode { position }.into()),
            }
        }
    }
}
