//! # Carbon Oracle Aggregation Benchmarks
//!
//! Aggregation runs synchronously inside the per-feed lock, so its cost is
//! the lock hold time for every round close:
//!
//! | Path | Complexity | Target |
//! |------|------------|--------|
//! | Strategies | O(n log n) in quorum size | < 10µs at 20 reporters |
//! | Quality score | O(n) | < 1µs |
//! | Dispersion vote | O(n) | < 1µs |
//! | Submit (round close) | lock + aggregate | < 50µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oracle_aggregation::config::QualityConfig;
use oracle_aggregation::domain::aggregation::{
    median, trimmed_mean, weighted_average, weighted_median,
};
use oracle_aggregation::domain::{AggregationEngine, AnomalyDetector, QualityInputs};
use oracle_aggregation::{AggregationStrategy, OracleConfig};
use oracle_tests::integration::fixtures::{Oracle, FRESHNESS_WINDOW, START};
use rand::Rng;
use std::time::Duration;

const QUORUM_SIZES: [usize; 3] = [3, 10, 20];

fn random_round(size: usize) -> (Vec<u128>, Vec<(u128, u32)>) {
    let mut rng = rand::thread_rng();
    let pairs: Vec<(u128, u32)> = (0..size)
        .map(|_| (rng.gen_range(9_000u128..11_000), rng.gen_range(1u32..=10_000)))
        .collect();
    let values = pairs.iter().map(|(v, _)| *v).collect();
    (values, pairs)
}

// ============================================================================
// Strategies
// ============================================================================

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation-strategies");

    for size in QUORUM_SIZES {
        let (values, pairs) = random_round(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("median", size), &values, |b, v| {
            b.iter(|| black_box(median(v)))
        });
        group.bench_with_input(BenchmarkId::new("trimmed_mean", size), &values, |b, v| {
            b.iter(|| black_box(trimmed_mean(v)))
        });
        group.bench_with_input(BenchmarkId::new("weighted_median", size), &pairs, |b, p| {
            b.iter(|| black_box(weighted_median(p)))
        });
        group.bench_with_input(BenchmarkId::new("weighted_average", size), &pairs, |b, p| {
            b.iter(|| black_box(weighted_average(p)))
        });
    }

    group.finish();
}

// ============================================================================
// Quality and dispersion
// ============================================================================

fn bench_quality_and_dispersion(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation-quality");
    let engine = AggregationEngine::new(QualityConfig::default());
    let detector = AnomalyDetector::default();

    for size in QUORUM_SIZES {
        let (values, _) = random_round(size);
        let reference = median(&values);

        group.bench_with_input(BenchmarkId::new("quality_score", size), &values, |b, v| {
            b.iter(|| {
                black_box(engine.quality_score(&QualityInputs {
                    min_oracles: 3,
                    values: v,
                    aggregate: reference,
                    previous_timestamp: Some(START),
                    freshness_window: FRESHNESS_WINDOW,
                    now: START + 60,
                }))
            })
        });
        group.bench_with_input(BenchmarkId::new("dispersion_vote", size), &values, |b, v| {
            b.iter(|| black_box(detector.assess(v, reference, 2_000)))
        });
    }

    group.finish();
}

// ============================================================================
// Submit path
// ============================================================================

fn bench_submit_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit-path");
    group.measurement_time(Duration::from_secs(10));

    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let oracle = rt.block_on(async {
        let oracle = Oracle::new(OracleConfig::default());
        oracle
            .add_feed("feed-1", AggregationStrategy::WeightedMedian, 3)
            .await;
        oracle
            .add_reporters(&[("r1", 5_000), ("r2", 3_000), ("r3", 2_000)])
            .await;
        oracle
    });

    group.throughput(Throughput::Elements(3));
    group.bench_function("three_submissions_closing_round", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(
                    oracle
                        .submit_round("feed-1", &[("r1", 10_000), ("r2", 10_050), ("r3", 9_950)])
                        .await,
                )
            })
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_strategies,
    bench_quality_and_dispersion,
    bench_submit_round
);
criterion_main!(benches);
