//! Timed measure loop used by the worker.

use std::hint::black_box;
use std::time::Instant;

/// Timing summary for one benchmark: mean and sample standard deviation of
/// the measured invocations, in milliseconds.
#[derive(Clone, Debug)]
pub struct Measured {
    pub iterations: u32,
    pub warmup_iterations: u32,
    pub average_ms: f64,
    pub error_ms: f64,
}

/// Run `f` for `warmup_iterations` untimed then `iterations` timed
/// invocations. Results are consumed through `black_box` so the optimizer
/// cannot elide the work.
pub fn measure_fn<T>(iterations: u32, warmup_iterations: u32, mut f: impl FnMut() -> T) -> Measured {
    for _ in 0..warmup_iterations {
        black_box(f());
    }

    let mut samples_ms = Vec::with_capacity(iterations as usize);
    for _ in 0..iterations.max(1) {
        let start = Instant::now();
        black_box(f());
        samples_ms.push(start.elapsed().as_secs_f64() * 1_000.0);
    }

    let n = samples_ms.len() as f64;
    let average_ms = samples_ms.iter().sum::<f64>() / n;
    let error_ms = if samples_ms.len() > 1 {
        let variance = samples_ms
            .iter()
            .map(|s| (s - average_ms).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    Measured {
        iterations: samples_ms.len() as u32,
        warmup_iterations,
        average_ms,
        error_ms,
    }
}

/// Render the fixed-grammar summary line the results collector parses:
/// `<suite>.<name>  avgt  <n>  <avg> ± <err> ms`.
pub fn summary_line(benchmark_id: &str, measured: &Measured) -> String {
    format!(
        "{}  avgt  {}  {:.3} ± {:.3} ms",
        benchmark_id, measured.iterations, measured.average_ms, measured.error_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_counts_iterations() {
        let mut calls = 0u32;
        let m = measure_fn(3, 2, || {
            calls += 1;
            calls
        });
        assert_eq!(calls, 5);
        assert_eq!(m.iterations, 3);
        assert_eq!(m.warmup_iterations, 2);
        assert!(m.average_ms >= 0.0);
    }

    #[test]
    fn single_iteration_has_zero_error() {
        let m = measure_fn(1, 0, || 1 + 1);
        assert_eq!(m.error_ms, 0.0);
    }

    #[test]
    fn summary_line_matches_collector_grammar() {
        let m = Measured {
            iterations: 2,
            warmup_iterations: 1,
            average_ms: 10.5,
            error_ms: 0.25,
        };
        assert_eq!(
            summary_line("alloc.small_objects", &m),
            "alloc.small_objects  avgt  2  10.500 ± 0.250 ms"
        );
    }
}
