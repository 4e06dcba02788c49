//! Benchmark suite for ingestion and batch iteration.
//!
//! Run with: `cargo bench`
//!
//! This benchmark measures:
//! - Ingestion of delimited rows (encoding, merging, filling)
//! - One full epoch per windowing strategy
//! - Min-max normalization overhead
//! - Averaged prediction smoothing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rebate_dataset::{
    ingest_reader, smooth_predictions, BatchIterator, FeatureRange, FeatureRanges, IngestOptions,
    IteratorKind, MinMaxScaler, Normalizer, Record, WindowConfig, WindowIterator,
};
use std::io::Cursor;
use std::sync::Arc;

/// Create a `;`-delimited file body with `entities` entities over `days` days.
fn create_csv(entities: usize, days: usize) -> String {
    let mut text = String::from("model;model_year;invoice_date;rebate;sales\n");
    let start = chrono::NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    for e in 0..entities {
        for d in 0..days {
            // Every seventh day is missing, every fifth is reported twice
            if d % 7 == 3 {
                continue;
            }
            let date = start + chrono::Duration::days(d as i64);
            let line = format!(
                "model_{};2016;{};{}.5;{}\n",
                e,
                date.format("%Y-%m-%d"),
                (d * 13 + e) % 400,
                (d * 31 + e * 7) % 900
            );
            text.push_str(&line);
            if d % 5 == 0 {
                text.push_str(&line);
            }
        }
    }
    text
}

/// Create dense records for one or more entities.
fn create_records(entities: u32, days: i64) -> Arc<[Record]> {
    (0..entities)
        .flat_map(|e| {
            (0..days).map(move |d| {
                Record::new(
                    e + 2,
                    2016,
                    d,
                    vec![((d * 13) % 400) as f64],
                    vec![((d * 31 + e as i64) % 900) as f64],
                )
            })
        })
        .collect::<Vec<_>>()
        .into()
}

/// Benchmark ingestion.
fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    for days in [365usize, 1460].iter() {
        let body = create_csv(10, *days);
        let options = IngestOptions::default().with_missing_days(true);

        group.throughput(Throughput::Elements((10 * days) as u64));
        group.bench_with_input(BenchmarkId::new("ingest_10_entities", days), &body, |b, body| {
            b.iter(|| {
                let output = ingest_reader(Cursor::new(black_box(body.as_bytes())), &options)
                    .unwrap();
                black_box(output.records.len())
            });
        });
    }

    group.finish();
}

/// Benchmark one epoch per strategy.
fn bench_epoch(c: &mut Criterion) {
    let mut group = c.benchmark_group("epoch");

    let single = create_records(1, 1460);
    let many = create_records(20, 365);

    for (kind, records) in [
        (IteratorKind::Sequential, &single),
        (IteratorKind::RandomSplit, &single),
        (IteratorKind::PerEntity, &many),
    ] {
        let ranges = FeatureRanges::from_records(records);
        let config = WindowConfig::new(kind, 22);
        let mut iterator =
            WindowIterator::new(records.clone(), ranges, &config, None).unwrap();

        group.throughput(Throughput::Elements(iterator.total_examples() as u64));
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                iterator.reset();
                let mut examples = 0;
                while iterator.has_next() {
                    examples += iterator.next_default().unwrap().size();
                }
                black_box(examples)
            });
        });
    }

    group.finish();
}

/// Benchmark min-max scaling.
fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");

    let values: Vec<f64> = (0..1000).map(|i| 100.0 + (i as f64 * 0.01)).collect();
    let scaler = MinMaxScaler::new(FeatureRange::new(100.0, 110.0));

    group.bench_function("minmax_batch_1000", |b| {
        b.iter(|| black_box(scaler.normalize_batch(black_box(&values))));
    });

    let records = create_records(1, 1000);
    let ranges = FeatureRanges::from_records(&records);
    group.bench_function("normalize_input_1000", |b| {
        b.iter(|| {
            for record in records.iter() {
                black_box(ranges.normalize_input(black_box(record)));
            }
        });
    });

    group.finish();
}

/// Benchmark averaged prediction smoothing.
fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");

    for input_days in [7usize, 22, 60].iter() {
        let predictions: Vec<Vec<f64>> = (0..365)
            .map(|i| (0..*input_days).map(|j| ((i + j) % 17) as f64).collect())
            .collect();

        group.bench_with_input(
            BenchmarkId::new("smooth_365_pairs", input_days),
            &predictions,
            |b, predictions| {
                b.iter(|| black_box(smooth_predictions(black_box(predictions), *input_days)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ingestion,
    bench_epoch,
    bench_normalization,
    bench_smoothing,
);

criterion_main!(benches);
