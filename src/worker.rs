//! Measurement worker.
//!
//! The orchestrator re-launches the current executable with `--gc-worker`
//! plus a configuration's policy flags; this module is that child process.
//! It runs the workload library under the selected reclamation policy and
//! prints the fixed-grammar summary and memory-delta lines the collector
//! parses from the redirected output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::Verbosity;
use crate::harness::{measure_fn, summary_line};
use crate::memory;
use crate::policy::{self, PolicyKind};
use crate::workloads::{self, WorkloadConfig, WorkloadCtx};

/// Fully parsed worker invocation.
#[derive(Debug, Clone)]
pub struct WorkerParams {
    pub policy: PolicyKind,
    pub sweep_batch: usize,
    pub generational: bool,
    pub compact: bool,
    pub include: Option<String>,
    pub warmup_iterations: u32,
    pub measurement_iterations: u32,
    pub forks: u32,
    pub threads: usize,
    pub fail_on_error: bool,
    pub verbosity: Verbosity,
    pub seed: u64,
    pub heap_max: u64,
    pub heap_min: u64,
    pub heap_log: Option<PathBuf>,
}

/// `--gc-probe`: validate the policy flags without running anything. The
/// orchestrator only looks at the exit code.
pub fn probe(params: &WorkerParams) -> i32 {
    match policy::build_policy(
        params.policy,
        params.sweep_batch,
        params.generational,
        params.compact,
    ) {
        Ok(policy) => {
            println!(
                "gc-compare-bench {} ({})",
                env!("CARGO_PKG_VERSION"),
                policy.name()
            );
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

/// Append-only sweep-event log. Opening or writing failures are reported
/// once and the log is disabled, never failing the run.
struct HeapEventLog {
    out: Option<File>,
    started: Instant,
}

impl HeapEventLog {
    fn open(path: Option<&Path>) -> Self {
        let out = path.and_then(|p| {
            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(file),
                Err(e) => {
                    eprintln!("heap log {} unavailable: {e}", p.display());
                    None
                }
            }
        });
        Self {
            out,
            started: Instant::now(),
        }
    }

    fn record(&mut self, policy_name: &str, reclaimed: u64, live: u64) {
        if let Some(out) = &mut self.out {
            let line = format!(
                "[{:9.3}s] {policy_name}: reclaimed {reclaimed} B, live {live} B\n",
                self.started.elapsed().as_secs_f64()
            );
            if let Err(e) = out.write_all(line.as_bytes()) {
                eprintln!("heap log write failed: {e}");
                self.out = None;
            }
        }
    }
}

/// `--gc-worker`: run every workload passing the include filter, once per
/// fork, printing one summary line per workload per fork. Returns the
/// process exit code.
pub fn run(params: &WorkerParams) -> i32 {
    // Parallel workloads honor --threads; a second build_global in-process
    // (tests) is harmless.
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(params.threads.max(1))
        .build_global();

    // Floor analogue of a preallocated heap: held for the worker's lifetime
    // so every policy starts from the same resident baseline.
    let _ballast = vec![0u8; params.heap_min as usize];

    let mut events = HeapEventLog::open(params.heap_log.as_deref());
    let cfg = WorkloadConfig {
        seed: params.seed,
        ..WorkloadConfig::default()
    };

    for fork in 0..params.forks.max(1) {
        if params.verbosity == Verbosity::Extra {
            println!("# Fork {}/{}", fork + 1, params.forks.max(1));
        }
        for workload in workloads::registry() {
            if let Some(filter) = &params.include {
                if !workloads::matches_filter(workload, filter) {
                    continue;
                }
            }

            let mut policy = match policy::build_policy(
                params.policy,
                params.sweep_batch,
                params.generational,
                params.compact,
            ) {
                Ok(policy) => policy,
                Err(e) => {
                    eprintln!("{e}");
                    return 1;
                }
            };

            // Fresh RNG per workload keeps allocation sequences identical
            // across policies and forks.
            let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
            let data = workloads::prepare_baseline(&mut rng, cfg.target_size);

            if params.verbosity != Verbosity::Quiet {
                println!("# Benchmark: {} ({})", workload.id, workload.label);
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                measure_fn(
                    params.measurement_iterations,
                    params.warmup_iterations,
                    || {
                        let mut ctx = WorkloadCtx {
                            rng: &mut rng,
                            cfg: &cfg,
                            data: &data,
                            policy: policy.as_mut(),
                            heap_max: params.heap_max,
                        };
                        (workload.run)(&mut ctx);
                    },
                )
            }));

            match outcome {
                Ok(measured) => {
                    println!("{}", summary_line(workload.id, &measured));
                    let reclaimed = policy.sweep();
                    events.record(policy.name(), reclaimed, memory::heap_used() as u64);
                }
                Err(_) => {
                    eprintln!("workload {} panicked", workload.id);
                    if params.fail_on_error {
                        return 1;
                    }
                }
            }
        }
    }
    0
}
