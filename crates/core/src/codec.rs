//! The compression pipeline end to end.
//!
//! ```text
//! source -> FrequencyCounter -> HuffmanTree -> BitstreamEncoder -> container
//! container -> HuffmanTree (rebuilt) -> BitstreamDecoder -> sink
//! ```
//!
//! Every call either returns a complete result or an error; no partial
//! container or output is handed back. Empty input compresses to an empty
//! container without building a tree.

use crate::config::CodecConfig;
use crate::container::CompressedContainer;
use crate::decoder::BitstreamDecoder;
use crate::encoder::BitstreamEncoder;
use crate::error::{CorruptStreamError, Result};
use crate::frequency::{FrequencyCounter, FrequencyTable};
use crate::metrics::Metrics;
use crate::source::{ByteSink, ByteSource};
use crate::tree::HuffmanTree;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a codec after validating `config`.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Count byte frequencies over the whole source.
    pub fn count<S: ByteSource + ?Sized>(&self, source: &S) -> Result<FrequencyTable> {
        FrequencyCounter::new(&self.config).count(source)
    }

    pub fn build_tree(&self, freqs: &FrequencyTable) -> Result<HuffmanTree> {
        HuffmanTree::from_frequencies(freqs)
    }

    /// Compress `source` into a container.
    pub fn compress<S: ByteSource + ?Sized>(&self, source: &S) -> Result<CompressedContainer> {
        self.compress_measured(source, &mut Metrics::new())
    }

    /// Compress `source` with a previously built tree.
    ///
    /// The container records the tree's own frequencies, so it decodes
    /// without access to the input the tree came from.
    ///
    /// # Errors
    /// `Error::UnknownSymbol` if `source` holds a byte the tree has no code
    /// for.
    pub fn compress_with_tree<S: ByteSource + ?Sized>(
        &self,
        tree: &HuffmanTree,
        source: &S,
    ) -> Result<CompressedContainer> {
        if source.length() == 0 {
            return Ok(CompressedContainer::empty());
        }
        let payload = BitstreamEncoder::new(tree.code_table(), &self.config).encode(source)?;
        Ok(CompressedContainer {
            symbol_count: payload.symbol_count,
            frequencies: tree.frequencies().clone(),
            payload: payload.bytes,
        })
    }

    /// Compress `source` and write the serialized container to `sink`.
    pub fn compress_into<S, K>(&self, source: &S, sink: &mut K) -> Result<Metrics>
    where
        S: ByteSource + ?Sized,
        K: ByteSink + ?Sized,
    {
        let mut metrics = Metrics::new();
        let container = self.compress_measured(source, &mut metrics)?;
        container.write_to(sink)?;
        metrics.output_bytes = container.serialized_len() as u64;
        metrics.complete();
        tracing::info!(
            input_bytes = metrics.input_bytes,
            output_bytes = metrics.output_bytes,
            ratio = metrics.compression_ratio(),
            "compressed"
        );
        Ok(metrics)
    }

    fn compress_measured<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        metrics: &mut Metrics,
    ) -> Result<CompressedContainer> {
        metrics.input_bytes = source.length();

        let started = Instant::now();
        let freqs = self.count(source)?;
        metrics.count_time = started.elapsed();

        if freqs.is_empty() {
            tracing::debug!("empty input, emitting empty container");
            return Ok(CompressedContainer::empty());
        }

        let started = Instant::now();
        let tree = self.build_tree(&freqs)?;
        metrics.build_time = started.elapsed();
        metrics.distinct_symbols = freqs.distinct();
        metrics.max_code_length = tree.max_code_length();

        let started = Instant::now();
        let payload = BitstreamEncoder::new(tree.code_table(), &self.config).encode(source)?;
        metrics.encode_time = started.elapsed();
        metrics.payload_bits = payload.bit_len;
        metrics.chunks = payload.chunks;

        Ok(CompressedContainer {
            symbol_count: payload.symbol_count,
            frequencies: freqs,
            payload: payload.bytes,
        })
    }

    /// Parse serialized container bytes, checking the CRC unless disabled.
    pub fn parse(&self, bytes: &[u8]) -> Result<CompressedContainer> {
        if self.config.verify_checksum {
            CompressedContainer::from_bytes(bytes)
        } else {
            CompressedContainer::from_bytes_unchecked(bytes)
        }
    }

    /// Reconstruct the original bytes of `container`.
    pub fn decompress(&self, container: &CompressedContainer) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decompress_container_into(container, &mut out, &mut Metrics::new())?;
        Ok(out)
    }

    /// Parse and decompress serialized container bytes.
    pub fn decompress_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        self.decompress(&self.parse(bytes)?)
    }

    /// Parse `bytes`, decompress, and write the original bytes to `sink`.
    pub fn decompress_into<K: ByteSink + ?Sized>(&self, bytes: &[u8], sink: &mut K) -> Result<Metrics> {
        let mut metrics = Metrics::new();
        let container = self.parse(bytes)?;
        metrics.output_bytes = bytes.len() as u64;
        self.decompress_container_into(&container, sink, &mut metrics)?;
        metrics.complete();
        tracing::info!(
            container_bytes = metrics.output_bytes,
            output_bytes = metrics.input_bytes,
            "decompressed"
        );
        Ok(metrics)
    }

    fn decompress_container_into<K: ByteSink + ?Sized>(
        &self,
        container: &CompressedContainer,
        sink: &mut K,
        metrics: &mut Metrics,
    ) -> Result<()> {
        if container.symbol_count == 0 {
            if !container.payload.is_empty() {
                return Err(CorruptStreamError::TrailingData {
                    extra_bits: container.payload.len() as u64 * 8,
                }
                .into());
            }
            return Ok(());
        }

        let started = Instant::now();
        let tree = container.tree()?.ok_or_else(|| {
            CorruptStreamError::InvalidFrequencyTable("no frequency entries".into())
        })?;
        metrics.build_time = started.elapsed();
        metrics.distinct_symbols = tree.code_table().len();
        metrics.max_code_length = tree.max_code_length();

        let started = Instant::now();
        metrics.payload_bits = BitstreamDecoder::new(&tree).decode_into(
            &container.payload,
            container.symbol_count,
            sink,
        )?;
        metrics.decode_time = started.elapsed();
        metrics.input_bytes = container.symbol_count;
        Ok(())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            config: CodecConfig::default(),
        }
    }
}

/// Compress `data` with the default configuration and serialize it.
pub fn compress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    Ok(Codec::default().compress(data)?.to_bytes())
}

/// Parse and decompress a serialized container with the default
/// configuration.
pub fn decompress_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    Codec::default().decompress_bytes(bytes)
}
