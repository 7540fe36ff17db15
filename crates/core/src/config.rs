//! Codec configuration.
//!
//! All knobs are tuning parameters: none of them changes the bytes of a
//! compressed container. Parallel and sequential runs over the same input
//! produce identical output for every chunk threshold.

use crate::error::{Error, Result};
use crate::frequency::DEFAULT_CHUNK_THRESHOLD;

/// Default block size for sequential reads (64 KiB).
pub const DEFAULT_READ_BLOCK: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Ranges longer than this are split for parallel counting and encoding
    pub chunk_threshold: usize,

    /// Use the rayon pool; false forces the sequential paths
    pub parallel: bool,

    /// Block size for sequential reads from the source
    pub read_block: usize,

    /// Check the container CRC when parsing
    pub verify_checksum: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            parallel: true,
            read_block: DEFAULT_READ_BLOCK,
            verify_checksum: true,
        }
    }
}

impl CodecConfig {
    /// Sequential configuration with default sizes.
    pub fn sequential() -> Self {
        Self::default().with_parallel(false)
    }

    pub fn with_chunk_threshold(mut self, chunk_threshold: usize) -> Self {
        self.chunk_threshold = chunk_threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_read_block(mut self, read_block: usize) -> Self {
        self.read_block = read_block;
        self
    }

    pub fn with_verify_checksum(mut self, verify_checksum: bool) -> Self {
        self.verify_checksum = verify_checksum;
        self
    }

    /// Reject zero sizes.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_threshold == 0 {
            return Err(Error::Config("chunk_threshold must be at least 1".into()));
        }
        if self.read_block == 0 {
            return Err(Error::Config("read_block must be at least 1".into()));
        }
        Ok(())
    }
}
