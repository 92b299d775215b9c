//! Benchmark for terrain generation.
//!
//! Run with: cargo bench --package strata_procedural --bench terrain_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_procedural::{ChunkCoord, ChunkDims, SimplexNoise, TerrainConfig, TerrainGenerator, WorldSeed};

fn benchmark_single_chunk(c: &mut Criterion) {
    let gen = TerrainGenerator::new(ChunkDims::new(16, 32, 16), TerrainConfig::default());

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(gen.generate(ChunkCoord::new(coord, coord / 2)))
        });
    });
}

fn benchmark_view_square(c: &mut Criterion) {
    let gen = TerrainGenerator::new(ChunkDims::new(16, 32, 16), TerrainConfig::default());

    let mut group = c.benchmark_group("view_square");
    group.sample_size(10);

    // Radius 6 around the observer = 13x13 chunks
    group.throughput(Throughput::Elements(13 * 13));
    group.bench_function("radius_6", |b| {
        b.iter(|| {
            for z in -6..=6 {
                for x in -6..=6 {
                    black_box(gen.generate(ChunkCoord::new(x, z)));
                }
            }
        });
    });

    group.finish();
}

fn benchmark_noise_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("simplex_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.37;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_chunk,
    benchmark_view_square,
    benchmark_noise_sample
);
criterion_main!(benches);
