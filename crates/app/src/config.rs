//! Command-line configuration for the huffpack binary.
//!
//! Every option has a default so `huffpack roundtrip` works with no other
//! arguments. Sample data is seeded; the seed is logged so a run can be
//! repeated exactly.

use crate::input_gen::SampleShape;
use clap::{Parser, Subcommand};
use huffpack_core::frequency::DEFAULT_CHUNK_THRESHOLD;
use huffpack_core::CodecConfig;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "huffpack", author, version, about = "Byte-oriented Huffman compressor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ranges longer than this many bytes are split across worker threads
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_THRESHOLD)]
    pub chunk_threshold: usize,

    /// Count and encode on the calling thread only
    #[arg(long, global = true)]
    pub sequential: bool,

    /// Size of the worker pool (default: one per core)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Skip the container checksum when decompressing
    #[arg(long, global = true)]
    pub no_verify: bool,

    /// Log filter, e.g. "debug" or "huffpack_core=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print the metrics summary after the run
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compress a file into a container
    Compress { input: PathBuf, output: PathBuf },

    /// Restore a file from a container
    Decompress { input: PathBuf, output: PathBuf },

    /// Print a container's header and code table
    Inspect { input: PathBuf },

    /// Compress and decompress in memory and verify the result
    Roundtrip {
        /// Input file (default: generate a sample)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Sample size in bytes
        #[arg(long, default_value_t = 1 << 20)]
        size: usize,

        /// Sample seed (default: time-based)
        #[arg(long)]
        seed: Option<u64>,

        /// Sample shape
        #[arg(long, value_enum, default_value_t = SampleShape::Mixed)]
        shape: SampleShape,
    },
}

impl Cli {
    /// Codec settings implied by the global options.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig::default()
            .with_chunk_threshold(self.chunk_threshold)
            .with_parallel(!self.sequential)
            .with_verify_checksum(!self.no_verify)
    }
}

/// Explicit seed, or one derived from the clock.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    })
}
