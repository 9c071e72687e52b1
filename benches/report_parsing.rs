//! Result-pipeline benchmark suite
//!
//! Benchmarks the orchestrator-side hot paths:
//! - Raw harness log parsing at various log sizes
//! - Report rendering from parsed results
//! - Byte formatting used in memory-delta lines

use std::fmt::Write as _;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use gc_compare_bench::collect::ResultsCollector;
use gc_compare_bench::config::configurations;
use gc_compare_bench::memory::format_bytes;
use gc_compare_bench::workloads::registry;

/// Build a raw harness log: one summary and one memory line per workload,
/// repeated, interleaved with chatter the parser must skip.
fn synthetic_log(repeats: usize) -> String {
    let mut log = String::new();
    for round in 0..repeats {
        writeln!(log, "# Fork {}/{}", round + 1, repeats).unwrap();
        for (i, workload) in registry().iter().enumerate() {
            writeln!(log, "# Benchmark: {} ({})", workload.id, workload.label).unwrap();
            writeln!(
                log,
                "{}  avgt  2  {}.{:03} ± 0.{:03} ms",
                workload.id,
                10 + i,
                round,
                i + 1
            )
            .unwrap();
            writeln!(
                log,
                "{} - Memory delta: {}",
                workload.label,
                format_bytes((i as u64 + 1) * 1024 * 1024)
            )
            .unwrap();
        }
    }
    log
}

fn bench_log_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_parsing");
    group.sample_size(30);

    let config = &configurations()[0];

    for repeats in [1, 10, 50] {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jmh_results.txt");
        std::fs::write(&path, synthetic_log(repeats)).unwrap();

        group.bench_with_input(
            BenchmarkId::new("parse_harness_log", repeats),
            &path,
            |bencher, path| {
                bencher.iter(|| {
                    let mut collector = ResultsCollector::new();
                    collector.parse_harness_log(
                        black_box(config),
                        path,
                        Duration::from_secs(1),
                    );
                    black_box(collector.into_results())
                })
            },
        );
    }

    group.finish();
}

fn bench_format_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_bytes");

    let samples: Vec<u64> = vec![
        512,
        10 * 1024,
        5 * 1024 * 1024,
        3 * 1024 * 1024 * 1024,
    ];

    group.bench_function("mixed_magnitudes", |bencher| {
        bencher.iter(|| {
            for &bytes in &samples {
                black_box(format_bytes(black_box(bytes)));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_log_parsing, bench_format_bytes);
criterion_main!(benches);
