//! Synthetic allocation workloads.
//!
//! Each workload is a named, self-contained procedure that allocates in one
//! fixed pattern, routes its dead objects through the active reclamation
//! policy, and prints a `<label> - Memory delta: <bytes>` line per
//! invocation. Workloads are deterministic for a given seed so allocation
//! behavior is comparable across collector configurations.

pub mod allocation;
pub mod collections;
pub mod strings;

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::memory::{format_bytes, MemorySnapshot};
use crate::policy::ReclaimPolicy;

/// Options every workload recognizes.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadConfig {
    /// Inner repeat count for the workload body.
    pub iterations: usize,
    /// Seed for the deterministic RNG.
    pub seed: u64,
    /// Pre-population size for baseline data structures.
    pub target_size: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            seed: 42,
            target_size: 50_000,
        }
    }
}

/// Baseline structures built once per workload, before any measured
/// invocation.
pub struct BaselineData {
    pub ints: Vec<i64>,
    pub map: HashMap<String, i64>,
    pub set: HashSet<String>,
    pub texts: Vec<String>,
}

const WORDS: &[&str] = &[
    "performance",
    "benchmark",
    "garbage",
    "collection",
    "memory",
    "allocation",
    "string",
    "processing",
    "concatenation",
    "manipulation",
    "optimization",
    "efficiency",
    "throughput",
    "latency",
    "scalability",
    "reliability",
];

/// Build the shared baseline data from a freshly seeded RNG.
pub fn prepare_baseline(rng: &mut ChaCha8Rng, target_size: usize) -> BaselineData {
    let mut ints = Vec::with_capacity(target_size);
    let mut map = HashMap::with_capacity(target_size);
    let mut set = HashSet::with_capacity(target_size);
    for i in 0..target_size {
        ints.push(rng.gen_range(0..100_000));
        map.insert(format!("key_{i}"), i as i64);
        set.insert(format!("element_{i}"));
    }

    // A smaller corpus of sentences for the string workloads.
    let sentences = (target_size / 5).max(16);
    let mut texts = Vec::with_capacity(sentences);
    for _ in 0..sentences {
        let word_count = rng.gen_range(5..15);
        let mut sentence = String::new();
        for j in 0..word_count {
            if j > 0 {
                sentence.push(' ');
            }
            sentence.push_str(WORDS[rng.gen_range(0..WORDS.len())]);
        }
        texts.push(sentence);
    }

    BaselineData {
        ints,
        map,
        set,
        texts,
    }
}

/// Everything a workload body needs for one invocation.
pub struct WorkloadCtx<'a> {
    pub rng: &'a mut ChaCha8Rng,
    pub cfg: &'a WorkloadConfig,
    pub data: &'a BaselineData,
    pub policy: &'a mut dyn ReclaimPolicy,
    pub heap_max: u64,
}

impl WorkloadCtx<'_> {
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot::capture(self.heap_max)
    }

    /// Best-effort settled snapshot: sweeps the active policy twice with a
    /// short pause between so deferred reclamation can complete before
    /// sampling. A hint, not a guarantee; callers must only compare deltas.
    pub fn settled_snapshot(&mut self) -> MemorySnapshot {
        self.policy.sweep();
        std::thread::sleep(std::time::Duration::from_millis(10));
        self.policy.sweep();
        MemorySnapshot::capture(self.heap_max)
    }

    /// Emit the per-invocation memory line the results collector parses.
    pub fn report_delta(&self, label: &str, before: &MemorySnapshot, after: &MemorySnapshot) {
        println!(
            "{} - Memory delta: {}",
            label,
            format_bytes(MemorySnapshot::delta(before, after))
        );
    }
}

/// A named workload procedure.
pub struct Workload {
    /// Benchmark identifier as printed in summary lines, `<suite>.<name>`.
    pub id: &'static str,
    /// Human label used in memory-delta lines.
    pub label: &'static str,
    /// Suite the workload belongs to; the CLI filter matches on this.
    pub suite: &'static str,
    pub run: fn(&mut WorkloadCtx),
}

/// All workloads in execution order.
pub fn registry() -> &'static [Workload] {
    &[
        Workload {
            id: "alloc.small_objects",
            label: "Small objects",
            suite: "allocation",
            run: allocation::small_objects,
        },
        Workload {
            id: "alloc.medium_objects",
            label: "Medium objects",
            suite: "allocation",
            run: allocation::medium_objects,
        },
        Workload {
            id: "alloc.large_objects",
            label: "Large objects",
            suite: "allocation",
            run: allocation::large_objects,
        },
        Workload {
            id: "alloc.mixed_pattern",
            label: "Mixed allocation",
            suite: "allocation",
            run: allocation::mixed_pattern,
        },
        Workload {
            id: "alloc.high_pressure",
            label: "High pressure",
            suite: "allocation",
            run: allocation::high_pressure,
        },
        Workload {
            id: "coll.vec_ops",
            label: "Vec operations",
            suite: "collections",
            run: collections::vec_ops,
        },
        Workload {
            id: "coll.deque_ops",
            label: "Deque operations",
            suite: "collections",
            run: collections::deque_ops,
        },
        Workload {
            id: "coll.map_ops",
            label: "Map operations",
            suite: "collections",
            run: collections::map_ops,
        },
        Workload {
            id: "coll.set_ops",
            label: "Set operations",
            suite: "collections",
            run: collections::set_ops,
        },
        Workload {
            id: "coll.par_map_ops",
            label: "Parallel map churn",
            suite: "collections",
            run: collections::par_map_ops,
        },
        Workload {
            id: "str.concat",
            label: "String concatenation",
            suite: "strings",
            run: strings::concat,
        },
        Workload {
            id: "str.builder",
            label: "String builder",
            suite: "strings",
            run: strings::builder,
        },
        Workload {
            id: "str.split_join",
            label: "String split join",
            suite: "strings",
            run: strings::split_join,
        },
        Workload {
            id: "str.regex_transform",
            label: "Regex transform",
            suite: "strings",
            run: strings::regex_transform,
        },
    ]
}

/// Suite names in registry order, deduplicated.
pub fn suite_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    for workload in registry() {
        if !names.contains(&workload.suite) {
            names.push(workload.suite);
        }
    }
    names
}

/// Case-insensitive substring match on the suite name or benchmark id.
pub fn matches_filter(workload: &Workload, filter: &str) -> bool {
    let needle = filter.to_ascii_lowercase();
    workload.suite.to_ascii_lowercase().contains(&needle)
        || workload.id.to_ascii_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DirectDrop;
    use rand_chacha::rand_core::SeedableRng;

    fn tiny_cfg() -> WorkloadConfig {
        WorkloadConfig {
            iterations: 50,
            seed: 42,
            target_size: 100,
        }
    }

    #[test]
    fn suite_names_are_unique_and_ordered() {
        assert_eq!(suite_names(), vec!["allocation", "collections", "strings"]);
    }

    #[test]
    fn filter_matches_suite_and_id() {
        let w = &registry()[0];
        assert!(matches_filter(w, "ALLOC"));
        assert!(matches_filter(w, "small_objects"));
        assert!(!matches_filter(w, "strings"));
    }

    #[test]
    fn baseline_is_deterministic_for_seed() {
        let cfg = tiny_cfg();
        let mut a = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut b = ChaCha8Rng::seed_from_u64(cfg.seed);
        let da = prepare_baseline(&mut a, cfg.target_size);
        let db = prepare_baseline(&mut b, cfg.target_size);
        assert_eq!(da.ints, db.ints);
        assert_eq!(da.texts, db.texts);
        assert_eq!(da.set.len(), db.set.len());
    }

    #[test]
    fn settled_snapshot_drains_deferred_garbage() {
        let cfg = tiny_cfg();
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let data = prepare_baseline(&mut rng, cfg.target_size);
        let mut policy = crate::policy::DeferredSweep::new(1024, false);
        let mut ctx = WorkloadCtx {
            rng: &mut rng,
            cfg: &cfg,
            data: &data,
            policy: &mut policy,
            heap_max: 0,
        };
        for _ in 0..10 {
            ctx.policy.retire(crate::policy::Garbage::Bytes(vec![0u8; 64]));
        }
        assert!(ctx.policy.retained() > 0);
        ctx.settled_snapshot();
        assert_eq!(ctx.policy.retained(), 0);
    }

    #[test]
    fn every_workload_runs_under_tiny_config() {
        let cfg = tiny_cfg();
        for workload in registry() {
            let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
            let data = prepare_baseline(&mut rng, cfg.target_size);
            let mut policy = DirectDrop;
            let mut ctx = WorkloadCtx {
                rng: &mut rng,
                cfg: &cfg,
                data: &data,
                policy: &mut policy,
                heap_max: 0,
            };
            (workload.run)(&mut ctx);
        }
    }
}
