//! Error types for the huffpack codec.
//!
//! Every operation returns a structured error rather than panicking. The
//! top-level [`Error`] groups failures into four user-facing kinds (see
//! [`ErrorKind`]): source/sink I/O, empty input offered to tree
//! construction, an encode-time symbol missing from the code table, and a
//! malformed or truncated compressed stream.

use thiserror::Error;

/// Top-level error type for all codec operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the byte source or writing the byte sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree construction was offered a frequency table with zero total weight
    #[error("empty input: cannot build a code table from zero symbols")]
    EmptyInput,

    /// A source byte has no entry in the code table used for encoding
    #[error("symbol {symbol:#04x} at offset {offset} has no code in the table")]
    UnknownSymbol { symbol: u8, offset: u64 },

    /// The compressed container or its payload is malformed
    #[error("corrupt stream: {0}")]
    CorruptStream(#[from] CorruptStreamError),

    /// Bit reader/writer misuse
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Frequency weights summed past u64
    #[error("frequency weights overflow u64")]
    WeightOverflow,

    /// A derived code is longer than the encoder can represent
    #[error("code length {length} exceeds maximum {max}")]
    CodeTooLong { length: usize, max: usize },

    /// Invalid codec configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    EmptyInput,
    UnknownSymbol,
    CorruptStream,
    Config,
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::EmptyInput => ErrorKind::EmptyInput,
            Error::UnknownSymbol { .. } => ErrorKind::UnknownSymbol,
            Error::CorruptStream(_) => ErrorKind::CorruptStream,
            Error::Config(_) => ErrorKind::Config,
            Error::BitIo(_) | Error::WeightOverflow | Error::CodeTooLong { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Re-home a tree construction failure as stream corruption.
    ///
    /// A frequency table read back from a container that cannot produce a
    /// valid tree means the container itself is bad.
    pub(crate) fn into_corrupt(self) -> Error {
        match self {
            Error::EmptyInput | Error::WeightOverflow | Error::CodeTooLong { .. } => {
                CorruptStreamError::InvalidFrequencyTable(self.to_string()).into()
            }
            other => other,
        }
    }
}

/// Ways a compressed container can be malformed.
#[derive(Debug, Error)]
pub enum CorruptStreamError {
    /// Container is too short to hold its fixed header
    #[error("container too short: need at least {required} bytes, got {actual}")]
    TooShort { required: usize, actual: usize },

    /// Magic number does not identify a huffpack container
    #[error("invalid magic number: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),

    /// Total container length disagrees with the lengths in its header
    #[error("length mismatch: header implies {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Checksum { expected: u32, actual: u32 },

    /// Frequency entries are unsorted, duplicated, zero, or cannot form a tree
    #[error("invalid frequency table: {0}")]
    InvalidFrequencyTable(String),

    /// Bits ran out before the declared number of symbols was decoded
    #[error("payload exhausted after {decoded} of {expected} symbols")]
    PayloadExhausted { decoded: u64, expected: u64 },

    /// A bit sequence matched no code
    #[error("invalid code at bit position {position}")]
    InvalidCode { position: u64 },

    /// Whole bytes remain after the last declared symbol
    #[error("{extra_bits} unused bits after the last symbol")]
    TrailingData { extra_bits: u64 },
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read past the end of the buffer
    #[error("unexpected end of bit stream")]
    UnexpectedEof,

    /// Invalid bit count (more than 64 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),

    /// Starting bit phase outside 0..8
    #[error("invalid bit phase: {0}")]
    InvalidPhase(u8),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::EmptyInput.kind(), ErrorKind::EmptyInput);
        assert_eq!(
            Error::UnknownSymbol { symbol: 7, offset: 3 }.kind(),
            ErrorKind::UnknownSymbol
        );
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
        assert_eq!(
            Error::from(CorruptStreamError::UnsupportedVersion(9)).kind(),
            ErrorKind::CorruptStream
        );
    }

    #[test]
    fn test_into_corrupt() {
        assert_eq!(Error::WeightOverflow.into_corrupt().kind(), ErrorKind::CorruptStream);
        assert_eq!(Error::EmptyInput.into_corrupt().kind(), ErrorKind::CorruptStream);
        assert_eq!(Error::Config("x".into()).into_corrupt().kind(), ErrorKind::Config);
    }

    #[test]
    fn test_display_mentions_symbol() {
        let err = Error::UnknownSymbol { symbol: 0x41, offset: 12 };
        let text = err.to_string();
        assert!(text.contains("0x41"));
        assert!(text.contains("12"));
    }
}
