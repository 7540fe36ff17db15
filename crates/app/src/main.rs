mod config;
mod input_gen;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{resolve_seed, Cli, Command};
use huffpack_core::{ByteSink, Codec, CompressedContainer, FileSource, Metrics, WriteSink};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to size the worker pool")?;
        tracing::debug!(threads, "worker pool sized");
    }

    let codec = Codec::new(cli.codec_config())?;
    let metrics = run(&cli.command, &codec)?;

    if cli.metrics {
        if let Some(metrics) = metrics {
            metrics.print_summary();
        }
    }
    Ok(())
}

/// Install the fmt subscriber. `--log-level` wins over `RUST_LOG`; the
/// fallback is `info`.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("logging already initialized")?;
    Ok(())
}

fn run(command: &Command, codec: &Codec) -> Result<Option<Metrics>> {
    match command {
        Command::Compress { input, output } => compress_file(codec, input, output).map(Some),
        Command::Decompress { input, output } => decompress_file(codec, input, output).map(Some),
        Command::Inspect { input } => {
            let bytes = std::fs::read(input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let container = codec.parse(&bytes)?;
            print!("{}", describe(&container)?);
            Ok(None)
        }
        Command::Roundtrip { input, size, seed, shape } => {
            let data = match input {
                Some(path) => std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let seed = resolve_seed(*seed);
                    tracing::info!(?shape, seed, size, "generating sample");
                    input_gen::generate_sample(*shape, seed, *size)
                }
            };
            roundtrip(codec, &data).map(Some)
        }
    }
}

fn compress_file(codec: &Codec, input: &Path, output: &Path) -> Result<Metrics> {
    let source = FileSource::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let mut packed = Vec::new();
    let metrics = codec.compress_into(&source, &mut packed)?;
    write_output(output, &packed)?;
    Ok(metrics)
}

fn decompress_file(codec: &Codec, input: &Path, output: &Path) -> Result<Metrics> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let mut restored = Vec::new();
    let metrics = codec
        .decompress_into(&bytes, &mut restored)
        .with_context(|| format!("failed to decompress {}", input.display()))?;
    write_output(output, &restored)?;
    Ok(metrics)
}

/// Create `output` only once its full contents are known, so a failed run
/// never leaves a partial file behind.
fn write_output(output: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut sink = WriteSink::new(BufWriter::new(file));
    sink.append(bytes)?;
    sink.into_inner()?;
    Ok(())
}

/// Compress and decompress `data` in memory; fail if the output differs.
fn roundtrip(codec: &Codec, data: &[u8]) -> Result<Metrics> {
    let mut packed = Vec::new();
    let mut metrics = codec.compress_into(data, &mut packed)?;

    let mut unpacked = Vec::with_capacity(data.len());
    let decoded = codec.decompress_into(&packed, &mut unpacked)?;

    if unpacked != data {
        let at = unpacked
            .iter()
            .zip(data)
            .position(|(a, b)| a != b)
            .unwrap_or(unpacked.len().min(data.len()));
        bail!(
            "roundtrip mismatch at byte {at} ({} bytes in, {} bytes out)",
            data.len(),
            unpacked.len()
        );
    }

    metrics.decode_time = decoded.decode_time;
    tracing::info!(
        bytes = data.len(),
        container = packed.len(),
        "roundtrip verified"
    );
    Ok(metrics)
}

/// Human-readable header and code table of a container.
fn describe(container: &CompressedContainer) -> Result<String> {
    use std::fmt::Write;

    let mut out = String::new();
    writeln!(out, "symbols:      {}", container.symbol_count)?;
    writeln!(out, "distinct:     {}", container.frequencies.distinct())?;
    writeln!(out, "payload:      {} bytes", container.payload.len())?;
    writeln!(out, "container:    {} bytes", container.serialized_len())?;

    let Some(tree) = container.tree()? else {
        return Ok(out);
    };
    writeln!(out, "max code len: {}", tree.max_code_length())?;
    writeln!(out)?;
    writeln!(out, "{:<6} {:>12}  code", "byte", "count")?;
    for (symbol, code) in tree.code_table().iter() {
        let count = container.frequencies.get(symbol);
        writeln!(out, "0x{symbol:02x}   {count:>12}  {code}")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_gen::SampleShape;

    #[test]
    fn test_roundtrip_every_shape() {
        let codec = Codec::default();
        for shape in [
            SampleShape::Mixed,
            SampleShape::Text,
            SampleShape::Single,
            SampleShape::Alphabet,
            SampleShape::Random,
        ] {
            let data = input_gen::generate_sample(shape, 5, 40_000);
            let metrics = roundtrip(&codec, &data).unwrap();
            assert_eq!(metrics.input_bytes, 40_000);
        }
        roundtrip(&codec, &[]).unwrap();
    }

    #[test]
    fn test_file_commands() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.bin");
        let packed = dir.path().join("raw.hp");
        let restored = dir.path().join("restored.bin");

        let data = input_gen::generate_sample(SampleShape::Text, 3, 10_000);
        std::fs::write(&raw, &data).unwrap();

        let codec = Codec::default();
        let compressed = compress_file(&codec, &raw, &packed).unwrap();
        assert_eq!(
            std::fs::metadata(&packed).unwrap().len(),
            compressed.output_bytes
        );
        decompress_file(&codec, &packed, &restored).unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), data);

        let summary = run(&Command::Inspect { input: packed }, &codec).unwrap();
        assert!(summary.is_none());
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.hp");
        std::fs::write(&bogus, b"not a container at all, just text").unwrap();
        let out = dir.path().join("out");
        let err = decompress_file(&Codec::default(), &bogus, &out).unwrap_err();
        assert!(err.to_string().contains("failed to decompress"));
        assert!(!out.exists());
    }

    #[test]
    fn test_truncated_container_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let packed = dir.path().join("short.hp");
        let out = dir.path().join("short.bin");

        let codec = Codec::default();
        let data = input_gen::generate_sample(SampleShape::Text, 11, 300_000);
        let mut container = codec.compress(&data).unwrap();
        container.payload.pop();
        std::fs::write(&packed, container.to_bytes()).unwrap();

        assert!(decompress_file(&codec, &packed, &out).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_describe() {
        let codec = Codec::default();
        let container = codec.compress(b"aaab".as_slice()).unwrap();
        let text = describe(&container).unwrap();
        assert!(text.contains("symbols:      4"));
        assert!(text.contains("0x61"));
        assert!(text.contains("0x62"));

        let empty = describe(&CompressedContainer::empty()).unwrap();
        assert!(empty.contains("distinct:     0"));
        assert!(!empty.contains("max code len"));
    }
}
