//! Report artifact generation.
//!
//! Three artifacts per suite run plus a JSON dump of the aggregate. Each is
//! generated independently: a write failure is reported on stderr and does
//! not block the remaining artifacts or affect the exit code.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config;
use crate::schema::{GcRunResult, RunMeta, SuiteReport};

/// Destination paths for one run's artifacts, timestamp-qualified so
/// successive suite runs never collide.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub detailed: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
}

impl ReportPaths {
    pub fn new(log_dir: &Path, result_dir: &Path, timestamp: &str) -> Self {
        Self {
            markdown: result_dir.join(format!("gc_benchmark_comparison_{timestamp}.md")),
            detailed: log_dir.join(format!("gc_benchmark_detailed_{timestamp}.txt")),
            csv: log_dir.join(format!("gc_benchmark_results_{timestamp}.csv")),
            json: log_dir.join(format!("gc_benchmark_results_{timestamp}.json")),
        }
    }
}

/// Generate every artifact, best-effort.
pub fn generate_all(paths: &ReportPaths, meta: &RunMeta, results: &[GcRunResult]) {
    let attempts: [(&Path, Box<dyn Fn(&mut dyn Write) -> io::Result<()>>); 4] = [
        (
            &paths.markdown,
            Box::new(|w: &mut dyn Write| write_markdown(w, results)),
        ),
        (
            &paths.detailed,
            Box::new(|w: &mut dyn Write| write_detailed(w, meta, results)),
        ),
        (
            &paths.csv,
            Box::new(|w: &mut dyn Write| write_csv(w, results)),
        ),
        (
            &paths.json,
            Box::new(|w: &mut dyn Write| write_json(w, meta, results)),
        ),
    ];

    for (path, write_fn) in attempts {
        if let Err(e) = write_artifact(path, write_fn.as_ref()) {
            eprintln!("failed to write {}: {e}", path.display());
        }
    }
}

fn write_artifact(path: &Path, write_fn: &dyn Fn(&mut dyn Write) -> io::Result<()>) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_fn(&mut writer)?;
    writer.flush()
}

/// Markdown comparison: summary table plus a head-to-head of the two
/// baseline configurations.
pub fn write_markdown(w: &mut dyn Write, results: &[GcRunResult]) -> io::Result<()> {
    writeln!(w, "# GC Strategy Benchmark Comparison")?;
    writeln!(w)?;
    writeln!(w, "| Configuration | Status | Avg Time (ms) | Throughput (ops/sec) |")?;
    writeln!(w, "|---------------|--------|---------------|----------------------|")?;

    for result in results {
        if result.successful {
            writeln!(
                w,
                "| {} | ✅ | {:.2} | {:.0} |",
                result.name,
                result.mean_average_time(),
                result.mean_throughput()
            )?;
        } else {
            writeln!(w, "| {} | ❌ | N/A | N/A |", result.name)?;
        }
    }
    writeln!(w)?;

    write_head_to_head(w, results)
}

fn write_head_to_head(w: &mut dyn Write, results: &[GcRunResult]) -> io::Result<()> {
    let (left, right) = config::baseline_pair();

    let benchmarks: BTreeSet<&str> = results
        .iter()
        .filter(|r| r.successful)
        .flat_map(|r| r.benchmarks.keys().map(String::as_str))
        .collect();
    if benchmarks.is_empty() {
        return Ok(());
    }

    writeln!(w, "| Benchmark | {} | {} | Winner |", left.name, right.name)?;
    writeln!(w, "|-----------|-------|-------|--------|")?;

    let lookup = |name: &str, bench: &str| -> Option<f64> {
        results
            .iter()
            .find(|r| r.successful && r.name == name)
            .and_then(|r| r.benchmarks.get(bench))
            .map(|b| b.average_time)
    };

    for bench in benchmarks {
        let left_time = lookup(left.name, bench);
        let right_time = lookup(right.name, bench);

        let cell = |t: Option<f64>| match t {
            Some(t) => format!("{t:.2} ms"),
            None => "N/A".to_string(),
        };
        // A winner needs both sides present and a strict ordering.
        let winner = match (left_time, right_time) {
            (Some(l), Some(r)) if l < r => left.name,
            (Some(l), Some(r)) if r < l => right.name,
            _ => "N/A",
        };

        let short = bench.rsplit('.').next().unwrap_or(bench);
        writeln!(
            w,
            "| {} | {} | {} | {} |",
            short,
            cell(left_time),
            cell(right_time),
            winner
        )?;
    }
    writeln!(w)
}

/// Plain-text deep-dive: every configuration in attempt order with flags,
/// status, all benchmark lines and all memory-delta lines.
pub fn write_detailed(w: &mut dyn Write, meta: &RunMeta, results: &[GcRunResult]) -> io::Result<()> {
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w, "GC STRATEGY BENCHMARK - DETAILED RESULTS")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w, "Generated: {}", meta.timestamp)?;
    writeln!(w, "Version: {}", meta.bench_version)?;
    writeln!(w, "Seed: {}", meta.seed)?;
    writeln!(w)?;

    for result in results {
        writeln!(w, "{}", "-".repeat(50))?;
        writeln!(w, "Configuration: {}", result.name)?;
        writeln!(w, "Flags: {}", result.flags)?;
        writeln!(
            w,
            "Status: {}",
            if result.successful { "SUCCESS" } else { "FAILED" }
        )?;
        writeln!(w, "Duration: {} ms", result.duration_ms)?;

        if let Some(error) = &result.error {
            writeln!(w, "Error: {error}")?;
        } else {
            writeln!(w)?;
            writeln!(w, "Benchmark Results:")?;
            for bench in result.benchmarks.values() {
                writeln!(
                    w,
                    "  {}: {:.3} ± {:.3} {} ({:.0} ops/sec)",
                    bench.benchmark, bench.average_time, bench.error_margin, bench.unit, bench.throughput
                )?;
            }
            writeln!(w)?;
            writeln!(w, "Memory Deltas:")?;
            for (operation, delta) in &result.memory_deltas {
                writeln!(w, "  {operation}: {delta}")?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}

/// CSV data dump: one row per (configuration, benchmark) pair; failed
/// configurations get a single N/A row.
pub fn write_csv(w: &mut dyn Write, results: &[GcRunResult]) -> io::Result<()> {
    writeln!(
        w,
        "GC_Name,GC_Flags,Status,Benchmark,Avg_Time_ms,Error_ms,Unit,Throughput_ops_sec"
    )?;

    for result in results {
        if result.successful {
            for bench in result.benchmarks.values() {
                writeln!(
                    w,
                    "{},\"{}\",SUCCESS,{},{:.3},{:.3},{},{:.0}",
                    result.name,
                    result.flags,
                    bench.benchmark,
                    bench.average_time,
                    bench.error_margin,
                    bench.unit,
                    bench.throughput
                )?;
            }
        } else {
            writeln!(
                w,
                "{},\"{}\",FAILED,N/A,N/A,N/A,N/A,N/A",
                result.name, result.flags
            )?;
        }
    }
    Ok(())
}

fn write_json(w: &mut dyn Write, meta: &RunMeta, results: &[GcRunResult]) -> io::Result<()> {
    let report = SuiteReport {
        run: meta.clone(),
        results: results.to_vec(),
    };
    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    w.write_all(json.as_bytes())?;
    writeln!(w)
}
