//! Command-line entry point.
//!
//! One binary, two roles: with no hidden flags it orchestrates the full
//! comparison suite; with `--gc-worker` or `--gc-probe` it runs as the
//! measurement child the orchestrator launches per configuration.

use std::path::PathBuf;

use clap::Parser;

use gc_compare_bench::config::{Verbosity, DEFAULT_HEAP_MAX, DEFAULT_HEAP_MIN};
use gc_compare_bench::memory::CountingAllocator;
use gc_compare_bench::orchestrator::Suite;
use gc_compare_bench::policy::PolicyKind;
use gc_compare_bench::worker::{self, WorkerParams};
use gc_compare_bench::workloads;

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(
    name = "gc-compare-bench",
    version,
    about = "Compare memory-reclamation strategies across a synthetic workload suite"
)]
struct Cli {
    /// Restrict the run to matching workloads (case-insensitive substring
    /// of a suite name or benchmark id, e.g. `allocation` or `str.concat`).
    workload: Option<String>,

    /// Directory for raw harness logs, heap event logs and CSV/JSON exports.
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,

    /// Directory for the Markdown comparison report.
    #[arg(long, default_value = "result")]
    result_dir: PathBuf,

    /// Seed for deterministic workload data.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    // Worker-mode flags below. The orchestrator passes these when
    // re-launching itself; hidden from --help.
    #[arg(long, hide = true)]
    gc_worker: bool,

    #[arg(long, hide = true)]
    gc_probe: bool,

    #[arg(long, value_enum, default_value = "direct", hide = true)]
    policy: PolicyKind,

    #[arg(long, default_value_t = 1024, hide = true)]
    sweep_batch: usize,

    #[arg(long, hide = true)]
    generational: bool,

    #[arg(long, hide = true)]
    compact: bool,

    #[arg(long, hide = true)]
    include: Option<String>,

    #[arg(long, default_value_t = 1, hide = true)]
    warmup_iters: u32,

    #[arg(long, default_value_t = 2, hide = true)]
    measurement_iters: u32,

    #[arg(long, default_value_t = 1, hide = true)]
    forks: u32,

    #[arg(long, default_value_t = 1, hide = true)]
    threads: usize,

    #[arg(long, hide = true)]
    fail_on_error: bool,

    #[arg(long, value_enum, default_value = "normal", hide = true)]
    verbosity: Verbosity,

    #[arg(long, default_value_t = DEFAULT_HEAP_MAX, hide = true)]
    heap_max: u64,

    #[arg(long, default_value_t = DEFAULT_HEAP_MIN, hide = true)]
    heap_min: u64,

    #[arg(long, hide = true)]
    heap_log: Option<PathBuf>,
}

impl Cli {
    fn worker_params(&self) -> WorkerParams {
        WorkerParams {
            policy: self.policy,
            sweep_batch: self.sweep_batch,
            generational: self.generational,
            compact: self.compact,
            include: self.include.clone(),
            warmup_iterations: self.warmup_iters,
            measurement_iterations: self.measurement_iters,
            forks: self.forks,
            threads: self.threads,
            fail_on_error: self.fail_on_error,
            verbosity: self.verbosity,
            seed: self.seed,
            heap_max: self.heap_max,
            heap_min: self.heap_min,
            heap_log: self.heap_log.clone(),
        }
    }
}

fn run(cli: Cli) -> i32 {
    if cli.gc_probe {
        return worker::probe(&cli.worker_params());
    }
    if cli.gc_worker {
        return worker::run(&cli.worker_params());
    }

    let filter = match cli.workload {
        None => None,
        Some(workload) => {
            let known = workloads::registry()
                .iter()
                .any(|w| workloads::matches_filter(w, &workload));
            if !known {
                eprintln!("Unknown workload '{workload}'. Available suites:");
                for suite in workloads::suite_names() {
                    eprintln!("  - {suite}");
                }
                return 1;
            }
            Some(workload)
        }
    };

    match Suite::new(&cli.log_dir, &cli.result_dir, cli.seed, filter) {
        Ok(suite) => {
            // Per-configuration failures are reported in the artifacts; the
            // suite itself still counts as a completed run.
            suite.execute();
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

fn main() {
    std::process::exit(run(Cli::parse()));
}
