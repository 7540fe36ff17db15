//! Huffman tree construction and code table derivation.
//!
//! The tree is an arena: nodes live in a `Vec` and internal nodes refer to
//! their children by index. Nothing points back up, so a built tree can be
//! shared freely between threads.
//!
//! # Tie-breaking
//!
//! Nodes are ordered by `(weight, tie)` where `tie` is the symbol value of a
//! leaf, or the smallest symbol under an internal node. Live nodes never
//! share a symbol, so the order is total and the same frequency table always
//! produces the same tree regardless of how the table was enumerated.
//!
//! # Single-symbol alphabets
//!
//! A strict binary tree cannot be built from one leaf. In that case the root
//! is the leaf itself and its symbol gets the one-bit code `0`.

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

/// Longest code the encoder can represent.
pub const MAX_CODE_LENGTH: usize = 128;

/// Index of a node in a [`HuffmanTree`] arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf { symbol: u8, weight: u64 },
    Internal { left: NodeId, right: NodeId, weight: u64 },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match *self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// A prefix code: `len` bits, right-aligned in `bits`, first bit most
/// significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u128,
    len: u8,
}

impl Code {
    /// Build a code from its right-aligned bits.
    ///
    /// # Errors
    /// `Error::CodeTooLong` if `len` is 0 or exceeds [`MAX_CODE_LENGTH`].
    pub fn new(bits: u128, len: usize) -> Result<Self> {
        if len == 0 || len > MAX_CODE_LENGTH {
            return Err(Error::CodeTooLong { length: len, max: MAX_CODE_LENGTH });
        }
        let mask = if len == 128 { u128::MAX } else { (1u128 << len) - 1 };
        Ok(Self { bits: bits & mask, len: len as u8 })
    }

    pub fn bits(&self) -> u128 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `i`-th bit in emission order, or `None` past the end.
    pub fn bit(&self, i: usize) -> Option<bool> {
        if i >= self.len() {
            return None;
        }
        Some((self.bits >> (self.len() - 1 - i)) & 1 == 1)
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }

    pub fn to_bit_string(&self) -> String {
        (0..self.len())
            .map(|i| if self.bit(i) == Some(true) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

/// Symbol to code mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; 256],
}

impl CodeTable {
    fn empty() -> Self {
        Self { codes: [None; 256] }
    }

    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes[symbol as usize]
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, code)| code.map(|c| (s as u8, c)))
    }

    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_length(&self) -> usize {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Check that no code is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<Code> = self.iter().map(|(_, c)| c).collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !a.is_prefix_of(b))
        })
    }

    /// Payload bits needed to encode input with these frequencies, or
    /// `None` if some counted symbol has no code.
    pub fn encoded_bit_length(&self, freqs: &FrequencyTable) -> Option<u64> {
        freqs.iter().try_fold(0u64, |acc, (symbol, count)| {
            let code = self.get(symbol)?;
            acc.checked_add(count.checked_mul(code.len() as u64)?)
        })
    }
}

/// A Huffman tree together with the code table derived from it.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
    codes: CodeTable,
    frequencies: FrequencyTable,
}

impl HuffmanTree {
    /// Build the tree for `freqs`.
    ///
    /// # Errors
    /// - `Error::EmptyInput` if every count is zero
    /// - `Error::WeightOverflow` if combined weights exceed u64
    /// - `Error::CodeTooLong` if a code would exceed [`MAX_CODE_LENGTH`]
    pub fn from_frequencies(freqs: &FrequencyTable) -> Result<Self> {
        let mut nodes = Vec::with_capacity(2 * freqs.distinct());
        let mut heap = BinaryHeap::new();

        for (symbol, weight) in freqs.iter() {
            let id = nodes.len();
            nodes.push(Node::Leaf { symbol, weight });
            heap.push(Reverse((weight, symbol, id)));
        }

        if heap.is_empty() {
            return Err(Error::EmptyInput);
        }

        while heap.len() > 1 {
            let (Some(Reverse((lw, ltie, left))), Some(Reverse((rw, rtie, right)))) =
                (heap.pop(), heap.pop())
            else {
                break;
            };
            let weight = lw.checked_add(rw).ok_or(Error::WeightOverflow)?;
            let id = nodes.len();
            nodes.push(Node::Internal { left, right, weight });
            heap.push(Reverse((weight, ltie.min(rtie), id)));
        }

        let root = match heap.pop() {
            Some(Reverse((_, _, id))) => id,
            None => return Err(Error::EmptyInput),
        };

        let codes = derive_codes(&nodes, root)?;
        tracing::debug!(
            distinct = codes.len(),
            max_code_length = codes.max_length(),
            "huffman tree built"
        );

        Ok(Self {
            nodes,
            root,
            codes,
            frequencies: freqs.clone(),
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn code_table(&self) -> &CodeTable {
        &self.codes
    }

    /// The frequency table this tree was built from.
    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    pub fn max_code_length(&self) -> usize {
        self.codes.max_length()
    }

    /// Payload bits this tree spends on input with frequencies `freqs`.
    pub fn encoded_bit_length(&self, freqs: &FrequencyTable) -> Option<u64> {
        self.codes.encoded_bit_length(freqs)
    }

    /// True when the alphabet has a single symbol and the root is a leaf.
    pub fn is_single_leaf(&self) -> bool {
        self.nodes[self.root].is_leaf()
    }
}

/// Depth-first walk from the root: `0` going left, `1` going right.
fn derive_codes(nodes: &[Node], root: NodeId) -> Result<CodeTable> {
    let mut table = CodeTable::empty();

    if let Node::Leaf { symbol, .. } = nodes[root] {
        table.codes[symbol as usize] = Some(Code::new(0, 1)?);
        return Ok(table);
    }

    let mut stack: Vec<(NodeId, u128, usize)> = vec![(root, 0, 0)];
    while let Some((id, bits, len)) = stack.pop() {
        match nodes[id] {
            Node::Leaf { symbol, .. } => {
                table.codes[symbol as usize] = Some(Code::new(bits, len)?);
            }
            Node::Internal { left, right, .. } => {
                if len + 1 > MAX_CODE_LENGTH {
                    return Err(Error::CodeTooLong { length: len + 1, max: MAX_CODE_LENGTH });
                }
                stack.push((right, (bits << 1) | 1, len + 1));
                stack.push((left, bits << 1, len + 1));
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn codes_of(freqs: &[(u8, u64)]) -> Vec<(u8, String)> {
        let table: FrequencyTable = freqs.iter().copied().collect();
        let tree = HuffmanTree::from_frequencies(&table).unwrap();
        tree.code_table()
            .iter()
            .map(|(s, c)| (s, c.to_bit_string()))
            .collect()
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = HuffmanTree::from_frequencies(&FrequencyTable::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn test_single_symbol_gets_zero() {
        let codes = codes_of(&[(0x41, 1000)]);
        assert_eq!(codes, vec![(0x41, "0".to_string())]);

        let table: FrequencyTable = [(0x41, 1000)].into_iter().collect();
        let tree = HuffmanTree::from_frequencies(&table).unwrap();
        assert!(tree.is_single_leaf());
        assert_eq!(tree.nodes().len(), 1);
    }

    #[test]
    fn test_equal_weights_break_ties_by_symbol() {
        let codes = codes_of(&[(b'd', 1), (b'c', 1), (b'b', 1), (b'a', 1)]);
        assert_eq!(
            codes,
            vec![
                (b'a', "00".to_string()),
                (b'b', "01".to_string()),
                (b'c', "10".to_string()),
                (b'd', "11".to_string()),
            ]
        );
    }

    #[test]
    fn test_internal_node_tie_uses_smallest_symbol() {
        // {a,b} merges to weight 2 with tie 'a', which sorts before leaf 'c'
        let codes = codes_of(&[(b'a', 1), (b'b', 1), (b'c', 2)]);
        assert_eq!(
            codes,
            vec![
                (b'a', "00".to_string()),
                (b'b', "01".to_string()),
                (b'c', "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_optimal_cost() {
        let freqs: FrequencyTable = [
            (b'a', 45),
            (b'b', 13),
            (b'c', 12),
            (b'd', 16),
            (b'e', 9),
            (b'f', 5),
        ]
        .into_iter()
        .collect();
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        assert_eq!(tree.encoded_bit_length(&freqs), Some(224));
        assert_eq!(tree.code_table().get(b'a').unwrap().len(), 1);
        assert_eq!(tree.node(tree.root()).unwrap().weight(), 100);
    }

    #[test]
    fn test_full_alphabet_is_prefix_free() {
        let freqs: FrequencyTable = (0..=255u8).map(|s| (s, 1 + (s as u64 % 17))).collect();
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        let table = tree.code_table();
        assert_eq!(table.len(), 256);
        assert!(table.is_prefix_free());
        // strict binary tree: k leaves, k - 1 internal nodes
        assert_eq!(tree.nodes().len(), 511);
    }

    #[test]
    fn test_strict_binary_weights() {
        let freqs = FrequencyTable::from_bytes(b"abracadabra, alakazam");
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        for node in tree.nodes() {
            if let Node::Internal { left, right, weight } = *node {
                let l = tree.node(left).unwrap().weight();
                let r = tree.node(right).unwrap().weight();
                assert_eq!(weight, l + r);
                assert_ne!(left, right);
            }
        }
    }

    #[test]
    fn test_fibonacci_weights_give_deep_tree() {
        let mut fib = vec![1u64, 1];
        while fib.len() < 40 {
            let n = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(n);
        }
        let freqs: FrequencyTable = fib.iter().enumerate().map(|(i, &w)| (i as u8, w)).collect();
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        assert_eq!(tree.max_code_length(), 39);
        assert!(tree.code_table().is_prefix_free());
    }

    #[test]
    fn test_weight_overflow() {
        let freqs: FrequencyTable = [(1, u64::MAX), (2, u64::MAX)].into_iter().collect();
        let err = HuffmanTree::from_frequencies(&freqs).unwrap_err();
        assert!(matches!(err, Error::WeightOverflow));
    }

    #[test]
    fn test_code_helpers() {
        let code = Code::new(0b101, 3).unwrap();
        assert_eq!(code.to_string(), "101");
        assert_eq!(code.bit(0), Some(true));
        assert_eq!(code.bit(1), Some(false));
        assert_eq!(code.bit(2), Some(true));
        assert_eq!(code.bit(3), None);
        assert_eq!(code.bit(usize::MAX), None);
        assert!(Code::new(0b10, 2).unwrap().is_prefix_of(&code));
        assert!(!Code::new(0b11, 2).unwrap().is_prefix_of(&code));
        assert!(Code::new(0, 0).is_err());
        assert!(Code::new(0, 129).is_err());
    }
}
