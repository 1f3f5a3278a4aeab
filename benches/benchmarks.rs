//! Performance benchmarks for ferro-negfeat
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- scanning

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ferro_negfeat::aggregate::aggregate;
use ferro_negfeat::coords::GenomicInterval;
use ferro_negfeat::feature::{Feature, FeatureKind, FeatureSelection};
use ferro_negfeat::flank::FlankedRegion;
use ferro_negfeat::pipeline::compute_negative_features;
use ferro_negfeat::scan::{
    scan_ambiguous, scan_extreme_gc, scan_homopolymers, GcParams, HomopolymerParams,
};

/// Deterministic pseudo-random sequence with runs, GC islands and Ns
fn synthetic_sequence(len: usize) -> String {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut seq = String::with_capacity(len);
    while seq.len() < len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        match state % 100 {
            0 => seq.push_str("AAAAAAAA"),
            1 => seq.push_str("GCGCGGCCGCGGCGCCGGGC"),
            2 => seq.push_str("NNNN"),
            n => seq.push(['A', 'C', 'G', 'T'][(n % 4) as usize]),
        }
    }
    seq.truncate(len);
    seq
}

// =============================================================================
// Scanner benchmarks
// =============================================================================

fn bench_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanning");
    for len in [10_000usize, 100_000, 1_000_000] {
        let seq = synthetic_sequence(len);
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("extreme_gc", len), &seq, |b, seq| {
            let params = GcParams::default();
            b.iter(|| scan_extreme_gc(black_box(seq), 0, &params))
        });
        group.bench_with_input(BenchmarkId::new("homopolymer", len), &seq, |b, seq| {
            let params = HomopolymerParams::default();
            b.iter(|| scan_homopolymers(black_box(seq), 0, &params))
        });
        group.bench_with_input(BenchmarkId::new("ambiguous", len), &seq, |b, seq| {
            b.iter(|| scan_ambiguous(black_box(seq), 0))
        });
    }
    group.finish();
}

// =============================================================================
// Aggregation benchmarks
// =============================================================================

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for count in [1_000usize, 10_000, 100_000] {
        let features: Vec<Feature> = (0..count)
            .map(|i| {
                let kind = FeatureKind::ALL[i % FeatureKind::ALL.len()];
                let start = (i as u64 * 37) % (count as u64 * 10);
                Feature::new(kind, start, start + 25, "bench")
            })
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &features, |b, features| {
            let selection = FeatureSelection::all();
            b.iter(|| aggregate(black_box(features.clone()), &selection))
        });
    }
    group.finish();
}

fn bench_compute_region(c: &mut Criterion) {
    let len = 200_000usize;
    let window = GenomicInterval::new(1_000_000, 1_000_000 + len as u64).unwrap();
    let region = FlankedRegion::new("1", window, synthetic_sequence(len)).unwrap();
    let selection = FeatureSelection::all();

    c.bench_function("compute_negative_features_200kb", |b| {
        b.iter(|| {
            compute_negative_features(
                black_box(&region),
                &selection,
                &Default::default(),
                &Default::default(),
                &[],
            )
        })
    });
}

criterion_group!(benches, bench_scanning, bench_aggregate, bench_compute_region);
criterion_main!(benches);
