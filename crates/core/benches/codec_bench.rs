use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use huffpack_core::{Codec, CodecConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn sample(len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let alphabet = b"abcdefghijklmnopqrstuvwxyz .,\n";
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let data = sample(4 * 1024 * 1024);
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Bytes(data.len() as u64));

    let sequential = Codec::new(CodecConfig::sequential()).unwrap();
    group.bench_function("sequential", |b| {
        b.iter(|| sequential.compress(black_box(&data)).unwrap())
    });

    for threshold in [1000usize, 16 * 1024, 256 * 1024] {
        let codec = Codec::new(CodecConfig::default().with_chunk_threshold(threshold)).unwrap();
        group.bench_with_input(BenchmarkId::new("parallel", threshold), &threshold, |b, _| {
            b.iter(|| codec.compress(black_box(&data)).unwrap())
        });
    }
    group.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let data = sample(1024 * 1024);
    let codec = Codec::default();
    let bytes = codec.compress(&data).unwrap().to_bytes();

    let mut group = c.benchmark_group("decompress");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("tree_walk", |b| {
        b.iter(|| codec.decompress_bytes(black_box(&bytes)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_compress, bench_decompress);
criterion_main!(benches);
