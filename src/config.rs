//! Collector configuration registry and harness options.
//!
//! The registry is a fixed, ordered list: the general-purpose baseline first,
//! then progressively more experimental variants, so every report renders the
//! same stable row order.

use std::path::PathBuf;

use clap::ValueEnum;

/// One named reclamation strategy: display name plus the worker flags that
/// select it. Immutable after startup.
#[derive(Debug, Clone, Copy)]
pub struct GcConfiguration {
    pub name: &'static str,
    pub flags: &'static [&'static str],
}

impl GcConfiguration {
    pub fn flags_string(&self) -> String {
        self.flags.join(" ")
    }

    /// Filename-safe form of the display name: lowercased, with runs of
    /// non-alphanumeric characters collapsed to a single dash.
    pub fn safe_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut pending_dash = false;
        for ch in self.name.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        out
    }
}

const CONFIGURATIONS: &[GcConfiguration] = &[
    GcConfiguration {
        name: "Direct Drop",
        flags: &["--policy", "direct"],
    },
    GcConfiguration {
        name: "Deferred Sweep",
        flags: &["--policy", "deferred", "--sweep-batch", "1024"],
    },
    GcConfiguration {
        name: "Generational Sweep",
        flags: &["--policy", "deferred", "--sweep-batch", "1024", "--generational"],
    },
    GcConfiguration {
        name: "Epoch Arena",
        flags: &["--policy", "arena"],
    },
    GcConfiguration {
        name: "Compacting Arena",
        flags: &["--policy", "arena", "--compact"],
    },
];

/// All configurations in evaluation order.
pub fn configurations() -> &'static [GcConfiguration] {
    CONFIGURATIONS
}

/// The two baseline configurations compared head-to-head in the Markdown
/// report: the first two registry entries.
pub fn baseline_pair() -> (&'static GcConfiguration, &'static GcConfiguration) {
    (&CONFIGURATIONS[0], &CONFIGURATIONS[1])
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Extra,
}

/// Everything the orchestrator passes to a worker besides the configuration
/// flags themselves. Iteration counts are deliberately small to bound total
/// suite wall-time.
#[derive(Debug, Clone)]
pub struct HarnessOptions {
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
    /// Raw harness output destination; the orchestrator redirects the
    /// worker's stdout and stderr here.
    pub output: PathBuf,
    /// Sweep-event log written by the worker itself.
    pub heap_log: PathBuf,
}

pub const DEFAULT_HEAP_MAX: u64 = 512 * 1024 * 1024;
pub const DEFAULT_HEAP_MIN: u64 = 128 * 1024 * 1024;

impl HarnessOptions {
    pub fn for_run(
        output: PathBuf,
        heap_log: PathBuf,
        include: Option<String>,
        seed: u64,
    ) -> Self {
        Self {
            include,
            warmup_iterations: 1,
            measurement_iterations: 2,
            forks: 1,
            threads: 1,
            fail_on_error: true,
            verbosity: Verbosity::Normal,
            seed,
            heap_max: DEFAULT_HEAP_MAX,
            heap_min: DEFAULT_HEAP_MIN,
            output,
            heap_log,
        }
    }

    /// Worker command-line arguments for this option set, appended after the
    /// configuration's own flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["--gc-worker".to_string()];
        if let Some(include) = &self.include {
            args.push("--include".to_string());
            args.push(include.clone());
        }
        args.push("--warmup-iters".to_string());
        args.push(self.warmup_iterations.to_string());
        args.push("--measurement-iters".to_string());
        args.push(self.measurement_iterations.to_string());
        args.push("--forks".to_string());
        args.push(self.forks.to_string());
        args.push("--threads".to_string());
        args.push(self.threads.to_string());
        if self.fail_on_error {
            args.push("--fail-on-error".to_string());
        }
        args.push("--verbosity".to_string());
        args.push(
            match self.verbosity {
                Verbosity::Quiet => "quiet",
                Verbosity::Normal => "normal",
                Verbosity::Extra => "extra",
            }
            .to_string(),
        );
        args.push("--seed".to_string());
        args.push(self.seed.to_string());
        args.push("--heap-max".to_string());
        args.push(self.heap_max.to_string());
        args.push("--heap-min".to_string());
        args.push(self.heap_min.to_string());
        args.push("--heap-log".to_string());
        args.push(self.heap_log.display().to_string());
        args
    }
}
