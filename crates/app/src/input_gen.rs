//! Sample input generation.
//!
//! When no input file is given, `roundtrip` compresses generated data. Each
//! shape exercises a different corner of the codec:
//! - `mixed`: runs, text, short patterns and noise in 8 KiB sections
//! - `text`: a small text-like alphabet
//! - `single`: one repeated byte (the one-bit code case)
//! - `alphabet`: every byte value, uniformly
//! - `random`: uniform noise (expands slightly)

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TEXT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz .!,\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleShape {
    Mixed,
    Text,
    Single,
    Alphabet,
    Random,
}

/// Generate `size_bytes` of data with the given shape, deterministically
/// from `seed`.
pub fn generate_sample(shape: SampleShape, seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match shape {
        SampleShape::Mixed => generate_mixed(&mut rng, size_bytes),
        SampleShape::Text => (0..size_bytes)
            .map(|_| TEXT_ALPHABET[rng.gen_range(0..TEXT_ALPHABET.len())])
            .collect(),
        SampleShape::Single => vec![rng.gen(); size_bytes],
        SampleShape::Alphabet => (0..size_bytes).map(|i| i as u8).collect(),
        SampleShape::Random => (0..size_bytes).map(|_| rng.gen()).collect(),
    }
}

fn generate_mixed(rng: &mut ChaCha8Rng, size_bytes: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let section = (size_bytes - data.len()).min(8192);

        match rng.gen_range(0..10u8) {
            // runs of one byte
            0..=2 => {
                let byte: u8 = rng.gen();
                data.extend(std::iter::repeat(byte).take(section));
            }
            // text-like
            3..=5 => {
                for _ in 0..section {
                    data.push(TEXT_ALPHABET[rng.gen_range(0..TEXT_ALPHABET.len())]);
                }
            }
            // repeating pattern
            6..=7 => {
                let pattern: Vec<u8> = (0..rng.gen_range(4..=32)).map(|_| rng.gen()).collect();
                data.extend(pattern.iter().cycle().take(section));
            }
            _ => {
                for _ in 0..section {
                    data.push(rng.gen());
                }
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_sizes() {
        for shape in SampleShape::value_variants() {
            for size in [0, 1, 100, 8193, 50_000] {
                assert_eq!(generate_sample(*shape, 999, size).len(), size, "{shape:?}");
            }
        }
    }

    #[test]
    fn test_determinism() {
        let a = generate_sample(SampleShape::Mixed, 12345, 20_000);
        let b = generate_sample(SampleShape::Mixed, 12345, 20_000);
        assert_eq!(a, b);
        assert_ne!(a, generate_sample(SampleShape::Mixed, 12346, 20_000));
    }

    #[test]
    fn test_shapes() {
        let single = generate_sample(SampleShape::Single, 1, 1000);
        assert!(single.iter().all(|&b| b == single[0]));

        let alphabet = generate_sample(SampleShape::Alphabet, 1, 512);
        let mut seen = [false; 256];
        alphabet.iter().for_each(|&b| seen[b as usize] = true);
        assert!(seen.iter().all(|&s| s));

        let text = generate_sample(SampleShape::Text, 1, 1000);
        assert!(text.iter().all(|b| TEXT_ALPHABET.contains(b)));
    }
}
