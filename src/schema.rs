//! Structured records built from parsed harness output.

use std::collections::BTreeMap;

use serde::Serialize;

/// Metadata for one suite run, captured once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub timestamp: String,
    pub seed: u64,
    pub workload_filter: Option<String>,
}

/// One parsed benchmark summary line. Throughput is always derived from the
/// average time and unit, never parsed from the log.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadResult {
    pub benchmark: String,
    pub average_time: f64,
    pub error_margin: f64,
    pub unit: String,
    pub throughput: f64,
}

/// Operations-per-second scale factor for a time unit. Unrecognized units
/// map to 0.0 so throughput degrades to zero rather than erroring.
pub fn throughput_scale(unit: &str) -> f64 {
    match unit {
        "ms" => 1_000.0,
        "us" | "µs" => 1_000_000.0,
        "ns" => 1_000_000_000.0,
        _ => 0.0,
    }
}

impl WorkloadResult {
    pub fn new(benchmark: String, average_time: f64, error_margin: f64, unit: String) -> Self {
        let throughput = if average_time > 0.0 {
            throughput_scale(&unit) / average_time
        } else {
            0.0
        };
        Self {
            benchmark,
            average_time,
            error_margin,
            unit,
            throughput,
        }
    }
}

/// Outcome of one configuration's run: either a populated result set or a
/// recorded failure. Exactly one of these exists per configuration attempted.
#[derive(Debug, Clone, Serialize)]
pub struct GcRunResult {
    pub name: String,
    pub flags: String,
    pub successful: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub benchmarks: BTreeMap<String, WorkloadResult>,
    pub memory_deltas: BTreeMap<String, String>,
}

impl GcRunResult {
    pub fn success(name: &str, flags: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: flags.to_string(),
            successful: true,
            error: None,
            duration_ms: 0,
            benchmarks: BTreeMap::new(),
            memory_deltas: BTreeMap::new(),
        }
    }

    pub fn failure(name: &str, flags: &str, error: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            flags: flags.to_string(),
            successful: false,
            error: Some(error.into()),
            duration_ms: 0,
            benchmarks: BTreeMap::new(),
            memory_deltas: BTreeMap::new(),
        }
    }

    /// Mean of per-benchmark average times, 0.0 when nothing parsed.
    pub fn mean_average_time(&self) -> f64 {
        if self.benchmarks.is_empty() {
            return 0.0;
        }
        self.benchmarks.values().map(|b| b.average_time).sum::<f64>() / self.benchmarks.len() as f64
    }

    /// Mean of per-benchmark throughputs, 0.0 when nothing parsed.
    pub fn mean_throughput(&self) -> f64 {
        if self.benchmarks.is_empty() {
            return 0.0;
        }
        self.benchmarks.values().map(|b| b.throughput).sum::<f64>() / self.benchmarks.len() as f64
    }
}

/// The full aggregate serialized as the JSON artifact.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run: RunMeta,
    pub results: Vec<GcRunResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_scale_is_total() {
        assert_eq!(throughput_scale("ms"), 1_000.0);
        assert_eq!(throughput_scale("us"), 1_000_000.0);
        assert_eq!(throughput_scale("µs"), 1_000_000.0);
        assert_eq!(throughput_scale("ns"), 1_000_000_000.0);
        assert_eq!(throughput_scale("s"), 0.0);
        assert_eq!(throughput_scale(""), 0.0);
        assert_eq!(throughput_scale("fortnights"), 0.0);
    }

    #[test]
    fn throughput_is_derived_from_unit() {
        let ms = WorkloadResult::new("a.b".into(), 10.0, 0.1, "ms".into());
        assert!((ms.throughput - 100.0).abs() < 1e-9);

        let ns = WorkloadResult::new("a.b".into(), 10.0, 0.1, "ns".into());
        assert!((ns.throughput - 100_000_000.0).abs() < 1e-3);

        let unknown = WorkloadResult::new("a.b".into(), 10.0, 0.1, "days".into());
        assert_eq!(unknown.throughput, 0.0);
    }

    #[test]
    fn means_over_empty_results_are_zero() {
        let result = GcRunResult::success("Direct Drop", "--policy direct");
        assert_eq!(result.mean_average_time(), 0.0);
        assert_eq!(result.mean_throughput(), 0.0);
    }

    #[test]
    fn means_average_across_benchmarks() {
        let mut result = GcRunResult::success("Direct Drop", "--policy direct");
        result.benchmarks.insert(
            "alloc.a".into(),
            WorkloadResult::new("alloc.a".into(), 10.0, 0.1, "ms".into()),
        );
        result.benchmarks.insert(
            "alloc.b".into(),
            WorkloadResult::new("alloc.b".into(), 20.0, 0.1, "ms".into()),
        );
        assert!((result.mean_average_time() - 15.0).abs() < 1e-9);
        assert!((result.mean_throughput() - 75.0).abs() < 1e-9);
    }
}
