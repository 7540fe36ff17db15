//! Metrics for a single compression or decompression run.
//!
//! Counts and phase timings are filled in by [`Codec`](crate::codec::Codec)
//! as it goes. The struct is plain data: one run, one owner.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Metrics {
    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    /// Time spent counting frequencies
    pub count_time: Duration,

    /// Time spent building the tree and code table
    pub build_time: Duration,

    /// Time spent encoding the payload
    pub encode_time: Duration,

    /// Time spent decoding the payload
    pub decode_time: Duration,

    // === Sizes ===
    /// Uncompressed bytes (read when compressing, written when decompressing)
    pub input_bytes: u64,

    /// Serialized container bytes
    pub output_bytes: u64,

    /// Meaningful payload bits
    pub payload_bits: u64,

    // === Code ===
    /// Symbols with a non-zero frequency
    pub distinct_symbols: usize,

    /// Longest code in the table
    pub max_code_length: usize,

    /// Chunks the encoder split the input into
    pub chunks: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            count_time: Duration::ZERO,
            build_time: Duration::ZERO,
            encode_time: Duration::ZERO,
            decode_time: Duration::ZERO,
            input_bytes: 0,
            output_bytes: 0,
            payload_bits: 0,
            distinct_symbols: 0,
            max_code_length: 0,
            chunks: 0,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Container size over original size; 0.0 for empty input.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }

    /// Average payload bits per input byte.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.payload_bits as f64 / self.input_bytes as f64
        }
    }

    /// Uncompressed bytes per second.
    pub fn throughput_bps(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.input_bytes as f64 / secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Codec Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();
        println!("Input:     {} bytes ({:.2} MiB)", self.input_bytes, self.input_bytes as f64 / 1024.0 / 1024.0);
        println!("Container: {} bytes ({:.2} MiB)", self.output_bytes, self.output_bytes as f64 / 1024.0 / 1024.0);
        println!("Ratio: {:.1}%", self.compression_ratio() * 100.0);
        println!();
        println!("=== Code ===");
        println!("Distinct symbols: {}", self.distinct_symbols);
        println!("Max code length: {} bits", self.max_code_length);
        println!("Payload: {} bits ({:.3} bits/symbol)", self.payload_bits, self.bits_per_symbol());
        println!("Chunks: {}", self.chunks);
        println!();
        println!("=== Phases ===");
        println!("Count:  {:?}", self.count_time);
        println!("Build:  {:?}", self.build_time);
        println!("Encode: {:?}", self.encode_time);
        println!("Decode: {:?}", self.decode_time);
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
        println!();
    }

    /// Export metrics as `key=value` lines.
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             input_bytes={}\n\
             output_bytes={}\n\
             compression_ratio={:.4}\n\
             payload_bits={}\n\
             bits_per_symbol={:.4}\n\
             distinct_symbols={}\n\
             max_code_length={}\n\
             chunks={}\n\
             count_us={}\n\
             build_us={}\n\
             encode_us={}\n\
             decode_us={}\n",
            self.duration().as_millis(),
            self.input_bytes,
            self.output_bytes,
            self.compression_ratio(),
            self.payload_bits,
            self.bits_per_symbol(),
            self.distinct_symbols,
            self.max_code_length,
            self.chunks,
            self.count_time.as_micros(),
            self.build_time.as_micros(),
            self.encode_time.as_micros(),
            self.decode_time.as_micros(),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
