//! Collection churn workloads over pre-populated baseline structures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hint::black_box;

use rand::Rng;
use rayon::prelude::*;

use super::WorkloadCtx;
use crate::policy::Garbage;

pub fn vec_ops(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut working = ctx.data.ints.clone();

    for _ in 0..ctx.cfg.iterations {
        working.push(ctx.rng.gen_range(0..100_000));
    }
    for _ in 0..ctx.cfg.iterations / 10 {
        let needle = ctx.rng.gen_range(0..100_000);
        black_box(working.contains(&needle));
    }
    for _ in 0..ctx.cfg.iterations / 2 {
        if working.is_empty() {
            break;
        }
        let idx = ctx.rng.gen_range(0..working.len());
        working.swap_remove(idx);
    }

    black_box(working.len());
    ctx.policy.retire(Garbage::Ints(working));

    let after = ctx.snapshot();
    ctx.report_delta("Vec operations", &before, &after);
}

pub fn deque_ops(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut working: VecDeque<i64> = ctx.data.ints.iter().copied().collect();

    for i in 0..ctx.cfg.iterations {
        let value = ctx.rng.gen_range(0..100_000);
        if i % 2 == 0 {
            working.push_front(value);
        } else {
            working.push_back(value);
        }
    }

    let filtered: Vec<i64> = working
        .iter()
        .copied()
        .filter(|v| v % 2 == 0)
        .take(ctx.cfg.iterations / 2)
        .collect();

    for _ in 0..ctx.cfg.iterations / 4 {
        if working.pop_front().is_none() {
            break;
        }
    }

    black_box(working.len());
    ctx.policy.retire(Garbage::Ints(working.into_iter().collect()));
    ctx.policy.retire(Garbage::Ints(filtered));

    let after = ctx.snapshot();
    ctx.report_delta("Deque operations", &before, &after);
}

pub fn map_ops(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut working: HashMap<String, i64> = ctx.data.map.clone();

    for i in 0..ctx.cfg.iterations {
        working.insert(format!("new_key_{i}"), ctx.rng.gen_range(0..100_000));
    }
    for _ in 0..ctx.cfg.iterations / 10 {
        let probe = format!("key_{}", ctx.rng.gen_range(0..ctx.cfg.target_size.max(1)));
        black_box(working.get(&probe));
    }
    for i in 0..ctx.cfg.iterations / 2 {
        if let Some((key, _)) = working.remove_entry(&format!("new_key_{i}")) {
            ctx.policy.retire(Garbage::Text(key));
        }
    }

    black_box(working.len());

    let after = ctx.snapshot();
    ctx.report_delta("Map operations", &before, &after);
}

pub fn set_ops(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut working: HashSet<String> = ctx.data.set.clone();

    for i in 0..ctx.cfg.iterations {
        working.insert(format!("new_element_{i}"));
    }
    for i in 0..ctx.cfg.iterations / 2 {
        if let Some(element) = working.take(&format!("new_element_{i}")) {
            ctx.policy.retire(Garbage::Text(element));
        }
    }

    black_box(working.len());

    let after = ctx.snapshot();
    ctx.report_delta("Set operations", &before, &after);
}

/// Parallel map construction and merge across worker threads. The
/// parallelism is internal to this single invocation; the orchestrator only
/// sees its wall-clock time and memory delta.
pub fn par_map_ops(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let chunk = (ctx.data.ints.len() / 8).max(1);
    let merged: HashMap<i64, u32> = ctx
        .data
        .ints
        .par_chunks(chunk)
        .map(|slice| {
            let mut local: HashMap<i64, u32> = HashMap::with_capacity(slice.len());
            for &value in slice {
                *local.entry(value % 4096).or_insert(0) += 1;
            }
            local
        })
        .reduce(HashMap::new, |mut acc, local| {
            for (key, count) in local {
                *acc.entry(key).or_insert(0) += count;
            }
            acc
        });

    black_box(merged.len());
    for key in merged.keys().take(64) {
        ctx.policy.retire(Garbage::Text(format!("bucket_{key}")));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Parallel map churn", &before, &after);
}
