//! Object allocation workloads: small, medium, large, mixed, and a high
//! pressure variant that interleaves bulk allocation with forced sweeps.

use std::hint::black_box;

use rand::Rng;

use super::WorkloadCtx;
use crate::policy::Garbage;

pub fn small_objects(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    for _ in 0..ctx.cfg.iterations {
        // 64-320 byte buffers, the short-lived nursery pattern.
        let size = ctx.rng.gen_range(64..320);
        let buf = vec![0u8; size];
        black_box(buf.len());
        ctx.policy.retire(Garbage::Bytes(buf));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Small objects", &before, &after);
}

pub fn medium_objects(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    for _ in 0..ctx.cfg.iterations / 10 {
        // 1-4 KiB buffers.
        let size = ctx.rng.gen_range(1024..4096);
        let buf = vec![0u8; size];
        black_box(buf.len());
        ctx.policy.retire(Garbage::Bytes(buf));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Medium objects", &before, &after);
}

pub fn large_objects(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    for _ in 0..(ctx.cfg.iterations / 100).max(1) {
        // 64-256 KiB buffers, large enough to bypass small-object paths.
        let size = ctx.rng.gen_range(64 * 1024..256 * 1024);
        let buf = vec![0u8; size];
        black_box(buf.len());
        ctx.policy.retire(Garbage::Bytes(buf));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Large objects", &before, &after);
}

pub fn mixed_pattern(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    for _ in 0..ctx.cfg.iterations {
        let choice = ctx.rng.gen_range(0..100);
        let size = if choice < 70 {
            // 70% small
            ctx.rng.gen_range(32..544)
        } else if choice < 95 {
            // 25% medium
            ctx.rng.gen_range(1024..9216)
        } else {
            // 5% large
            ctx.rng.gen_range(32 * 1024..96 * 1024)
        };
        let buf = vec![0u8; size];
        black_box(buf.len());
        ctx.policy.retire(Garbage::Bytes(buf));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Mixed allocation", &before, &after);
}

pub fn high_pressure(ctx: &mut WorkloadCtx) {
    // Settled baseline: earlier invocations may have left deferred garbage.
    let before = ctx.settled_snapshot();

    // Seed the heap with intermediate garbage before the main burst.
    create_pressure(ctx, 100);

    for i in 0..ctx.cfg.iterations {
        let size = ctx.rng.gen_range(256..2048);
        let buf = vec![0u8; size];
        black_box(buf.len());
        ctx.policy.retire(Garbage::Bytes(buf));

        // Periodic sweeps fragment the heap between bursts.
        if i % 1000 == 999 {
            ctx.policy.sweep();
            create_pressure(ctx, 10);
        }
    }
    let after = ctx.settled_snapshot();
    ctx.report_delta("High pressure", &before, &after);
}

/// Allocate and immediately retire short-lived objects of mixed shapes.
fn create_pressure(ctx: &mut WorkloadCtx, rounds: usize) {
    for round in 0..rounds {
        let ints: Vec<i64> = (0..1000).map(|i| i as i64).collect();
        black_box(ints.len());
        ctx.policy.retire(Garbage::Ints(ints));
        for j in 0..50 {
            let text = format!("pressure string {round}_{j}");
            black_box(text.len());
            ctx.policy.retire(Garbage::Text(text));
        }
    }
}
