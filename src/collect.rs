//! Parses raw harness logs into structured run results.
//!
//! The text grammar is fixed and versioned: two extraction patterns, one for
//! benchmark summary lines and one for memory-delta lines. Any other line is
//! harness chatter and is ignored. A change to the worker's output format is
//! a breaking change to these patterns, never silent data loss.

use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::config::GcConfiguration;
use crate::schema::{GcRunResult, WorkloadResult};

/// `alloc.small_objects  avgt  2  10.123 ± 0.456 ms`
const SUMMARY_PATTERN: &str = r"(\w+\.\w+)\s+avgt\s+\d+\s+([\d.]+)\s+±\s+([\d.]+)\s+(\w+)";

/// `Small objects - Memory delta: 1.50 MB`
const MEMORY_PATTERN: &str = r"(\w[\w ]*\w) - Memory delta: ([\d.]+ \w+)";

/// Accumulates one [`GcRunResult`] per configuration attempted and is
/// consumed exactly once by report generation.
pub struct ResultsCollector {
    summary_re: Regex,
    memory_re: Regex,
    results: Vec<GcRunResult>,
}

impl Default for ResultsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsCollector {
    pub fn new() -> Self {
        Self {
            summary_re: Regex::new(SUMMARY_PATTERN).expect("fixed summary pattern"),
            memory_re: Regex::new(MEMORY_PATTERN).expect("fixed memory pattern"),
            results: Vec::new(),
        }
    }

    /// Record a configuration that never produced a usable log.
    pub fn record_failure(
        &mut self,
        config: &GcConfiguration,
        error: impl Into<String>,
        duration: Duration,
    ) {
        let mut result = GcRunResult::failure(config.name, &config.flags_string(), error);
        result.duration_ms = duration.as_millis() as u64;
        self.upsert(result);
    }

    /// Parse a raw harness log for a completed configuration. A read failure
    /// records the configuration as failed with the I/O error message rather
    /// than propagating to the caller.
    pub fn parse_harness_log(
        &mut self,
        config: &GcConfiguration,
        log_path: &Path,
        duration: Duration,
    ) {
        let contents = match std::fs::read_to_string(log_path) {
            Ok(contents) => contents,
            Err(e) => {
                self.record_failure(config, e.to_string(), duration);
                return;
            }
        };

        let mut result = GcRunResult::success(config.name, &config.flags_string());
        result.duration_ms = duration.as_millis() as u64;

        for line in contents.lines() {
            if let Some(caps) = self.summary_re.captures(line) {
                let benchmark = caps[1].to_string();
                let average_time: f64 = caps[2].parse().unwrap_or(0.0);
                let error_margin: f64 = caps[3].parse().unwrap_or(0.0);
                let unit = caps[4].to_string();
                // Last match wins: a harness may reprint a line during retries.
                result.benchmarks.insert(
                    benchmark.clone(),
                    WorkloadResult::new(benchmark, average_time, error_margin, unit),
                );
            }

            if let Some(caps) = self.memory_re.captures(line) {
                result
                    .memory_deltas
                    .insert(caps[1].to_string(), caps[2].to_string());
            }
        }

        self.upsert(result);
    }

    /// One entry per configuration name: a later record for the same name
    /// replaces the earlier one in place, preserving attempt order.
    fn upsert(&mut self, result: GcRunResult) {
        if let Some(existing) = self.results.iter_mut().find(|r| r.name == result.name) {
            *existing = result;
        } else {
            self.results.push(result);
        }
    }

    pub fn results(&self) -> &[GcRunResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<GcRunResult> {
        self.results
    }
}
