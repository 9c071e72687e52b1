//! String processing workloads: naive concatenation, pre-sized builder,
//! split/join, and a regex-heavy transform.

use std::hint::black_box;

use regex::Regex;

use super::WorkloadCtx;
use crate::policy::Garbage;

const BASE: &str = "The quick brown fox jumps over the lazy dog. ";

/// Naive `+`-style concatenation: every round reallocates the accumulator.
pub fn concat(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut result = String::new();
    for i in 0..ctx.cfg.iterations / 10 {
        result = result + BASE + &i.to_string() + " ";
    }

    black_box(result.len());
    ctx.policy.retire(Garbage::Text(result));

    let after = ctx.snapshot();
    ctx.report_delta("String concatenation", &before, &after);
}

/// Pre-sized builder appends, the allocation-friendly counterpart.
pub fn builder(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    let mut sb = String::with_capacity(ctx.cfg.iterations * 50);
    for i in 0..ctx.cfg.iterations {
        sb.push_str(BASE);
        sb.push_str(&i.to_string());
        sb.push(' ');
    }

    black_box(sb.len());
    ctx.policy.retire(Garbage::Text(sb));

    let after = ctx.snapshot();
    ctx.report_delta("String builder", &before, &after);
}

pub fn split_join(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    for text in &ctx.data.texts {
        let processed: Vec<String> = text
            .split(' ')
            .map(|word| format!("{}_processed", word.to_uppercase()))
            .collect();
        let rejoined = processed.join("-");
        black_box(rejoined.len());
        ctx.policy.retire(Garbage::Text(rejoined));
    }

    let after = ctx.snapshot();
    ctx.report_delta("String split join", &before, &after);
}

pub fn regex_transform(ctx: &mut WorkloadCtx) {
    let before = ctx.snapshot();

    // Compiled per invocation on purpose: the compilation itself is part of
    // the allocation pattern being measured.
    let long_word = Regex::new(r"\b\w{8,}\b").expect("static pattern");

    for text in &ctx.data.texts {
        let replaced = long_word.replace_all(text, "<long>").into_owned();
        black_box(replaced.len());
        ctx.policy.retire(Garbage::Text(replaced));
    }

    let after = ctx.snapshot();
    ctx.report_delta("Regex transform", &before, &after);
}
