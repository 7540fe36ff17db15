//! huffpack-core: byte-oriented Huffman compression with parallel counting
//! and bit-exact parallel encoding
//!
//! This library provides:
//! - Frequency counting over any [`ByteSource`], split across the rayon pool
//! - Deterministic Huffman tree construction and code derivation
//! - An MSB-first encoder whose chunked parallel output is bit-for-bit
//!   identical to the sequential one
//! - A tree-walking decoder and a self-describing, checksummed container
//!
//! # Architecture
//!
//! - `source`: byte sources and sinks
//! - `frequency`: frequency tables and the fork-join counter
//! - `tree`: arena Huffman tree and code table
//! - `bitio`: bit reader/writer and phase splicing
//! - `encoder`: sequential and chunked payload encoding
//! - `decoder`: payload decoding
//! - `container`: wire format
//! - `codec`: the pipeline facade
//! - `metrics`: per-run counters and timings
//!
//! # Example
//!
//! ```
//! use huffpack_core::{Codec, CodecConfig};
//!
//! let codec = Codec::new(CodecConfig::default()).unwrap();
//! let data = b"abracadabra".to_vec();
//! let container = codec.compress(&data).unwrap();
//! let bytes = container.to_bytes();
//! assert_eq!(codec.decompress_bytes(&bytes).unwrap(), data);
//! ```

pub mod bitio;
pub mod codec;
pub mod config;
pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod metrics;
pub mod source;
pub mod tree;

// Re-export commonly used types
pub use codec::{compress_bytes, decompress_bytes, Codec};
pub use config::CodecConfig;
pub use container::CompressedContainer;
pub use decoder::BitstreamDecoder;
pub use encoder::{BitstreamEncoder, EncodedPayload};
pub use error::{Error, ErrorKind, Result};
pub use frequency::{FrequencyCounter, FrequencyTable};
pub use metrics::Metrics;
pub use source::{ByteSink, ByteSource, FileSource, WriteSink};
pub use tree::{Code, CodeTable, HuffmanTree};
