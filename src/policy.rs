//! Reclamation policies exercised by the worker.
//!
//! Workloads hand every dead object to the active [`ReclaimPolicy`] instead
//! of dropping it inline, so the configured strategy decides when the memory
//! actually goes back to the allocator. This is the knob the configuration
//! registry turns; everything else in a run is identical across policies.

use std::io;
use std::mem;

use clap::ValueEnum;

/// A dead object retired by a workload. Variants cover the allocation shapes
/// the workload library produces.
pub enum Garbage {
    Bytes(Vec<u8>),
    Ints(Vec<i64>),
    Text(String),
}

impl Garbage {
    /// Approximate payload size, used for reclaimed-byte accounting.
    pub fn approx_size(&self) -> u64 {
        match self {
            Garbage::Bytes(v) => v.capacity() as u64,
            Garbage::Ints(v) => (v.capacity() * mem::size_of::<i64>()) as u64,
            Garbage::Text(s) => s.capacity() as u64,
        }
    }
}

/// Strategy for releasing retired objects.
pub trait ReclaimPolicy: Send {
    fn name(&self) -> &'static str;

    /// Take ownership of a dead object. The policy decides whether it is
    /// dropped now or held until a sweep.
    fn retire(&mut self, garbage: Garbage);

    /// Release held objects, returning an estimate of the bytes reclaimed.
    fn sweep(&mut self) -> u64;

    /// Objects currently held for deferred release.
    fn retained(&self) -> usize;
}

impl std::fmt::Debug for dyn ReclaimPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Baseline: retired objects are dropped immediately.
pub struct DirectDrop;

impl ReclaimPolicy for DirectDrop {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn retire(&mut self, garbage: Garbage) {
        drop(garbage);
    }

    fn sweep(&mut self) -> u64 {
        0
    }

    fn retained(&self) -> usize {
        0
    }
}

/// Retired objects queue up and are dropped in batches of `sweep_batch`.
/// The generational variant promotes a fraction of each batch into a
/// survivor space that only empties on an explicit sweep.
pub struct DeferredSweep {
    sweep_batch: usize,
    generational: bool,
    queue: Vec<Garbage>,
    survivors: Vec<Garbage>,
}

/// One in this many retired objects survives a generational batch drop.
const PROMOTION_STRIDE: usize = 8;

impl DeferredSweep {
    pub fn new(sweep_batch: usize, generational: bool) -> Self {
        Self {
            sweep_batch: sweep_batch.max(1),
            generational,
            queue: Vec::new(),
            survivors: Vec::new(),
        }
    }

    fn drop_batch(&mut self) -> u64 {
        let mut reclaimed = 0;
        for (i, garbage) in self.queue.drain(..).enumerate() {
            if self.generational && i % PROMOTION_STRIDE == 0 && self.survivors.len() < self.sweep_batch {
                self.survivors.push(garbage);
            } else {
                reclaimed += garbage.approx_size();
            }
        }
        reclaimed
    }
}

impl ReclaimPolicy for DeferredSweep {
    fn name(&self) -> &'static str {
        if self.generational {
            "deferred-generational"
        } else {
            "deferred"
        }
    }

    fn retire(&mut self, garbage: Garbage) {
        self.queue.push(garbage);
        if self.queue.len() >= self.sweep_batch {
            self.drop_batch();
        }
    }

    fn sweep(&mut self) -> u64 {
        let mut reclaimed = self.drop_batch();
        reclaimed += self.survivors.drain(..).map(|g| g.approx_size()).sum::<u64>();
        reclaimed
    }

    fn retained(&self) -> usize {
        self.queue.len() + self.survivors.len()
    }
}

/// Retired objects accumulate in a region freed wholesale on sweep.
pub struct EpochArena {
    region: Vec<Garbage>,
    compact: bool,
}

impl EpochArena {
    pub fn new(compact: bool) -> Self {
        Self {
            region: Vec::new(),
            compact,
        }
    }
}

impl ReclaimPolicy for EpochArena {
    fn name(&self) -> &'static str {
        if self.compact {
            "arena-compacting"
        } else {
            "arena"
        }
    }

    fn retire(&mut self, garbage: Garbage) {
        self.region.push(garbage);
    }

    fn sweep(&mut self) -> u64 {
        let reclaimed = self.region.drain(..).map(|g| g.approx_size()).sum();
        if self.compact {
            self.region.shrink_to_fit();
        }
        reclaimed
    }

    fn retained(&self) -> usize {
        self.region.len()
    }
}

/// Policy selector on the worker command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Drop retired objects immediately.
    #[default]
    Direct,
    /// Batch retired objects, dropping `--sweep-batch` at a time.
    Deferred,
    /// Hold retired objects in a region freed wholesale.
    Arena,
}

/// Build the policy for a validated flag set. Rejects `--compact` in builds
/// without the `compacting-arena` feature, so an availability probe against
/// such a build exits non-zero.
pub fn build_policy(
    kind: PolicyKind,
    sweep_batch: usize,
    generational: bool,
    compact: bool,
) -> io::Result<Box<dyn ReclaimPolicy>> {
    if compact && kind != PolicyKind::Arena {
        return Err(io::Error::other("--compact requires --policy arena"));
    }
    if generational && kind != PolicyKind::Deferred {
        return Err(io::Error::other("--generational requires --policy deferred"));
    }
    match kind {
        PolicyKind::Direct => Ok(Box::new(DirectDrop)),
        PolicyKind::Deferred => Ok(Box::new(DeferredSweep::new(sweep_batch, generational))),
        PolicyKind::Arena => {
            if compact {
                #[cfg(feature = "compacting-arena")]
                {
                    return Ok(Box::new(EpochArena::new(true)));
                }
                #[cfg(not(feature = "compacting-arena"))]
                {
                    return Err(io::Error::other(
                        "compacting arena not available in this build",
                    ));
                }
            }
            Ok(Box::new(EpochArena::new(false)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(n: usize) -> Garbage {
        Garbage::Bytes(vec![0u8; n])
    }

    #[test]
    fn direct_drop_holds_nothing() {
        let mut policy = DirectDrop;
        policy.retire(bytes(1024));
        assert_eq!(policy.retained(), 0);
        assert_eq!(policy.sweep(), 0);
    }

    #[test]
    fn deferred_drops_in_batches() {
        let mut policy = DeferredSweep::new(4, false);
        for _ in 0..3 {
            policy.retire(bytes(100));
        }
        assert_eq!(policy.retained(), 3);
        policy.retire(bytes(100));
        // Fourth retire crossed the batch threshold.
        assert_eq!(policy.retained(), 0);
    }

    #[test]
    fn generational_keeps_survivors_until_sweep() {
        let mut policy = DeferredSweep::new(4, true);
        for _ in 0..4 {
            policy.retire(bytes(100));
        }
        assert!(policy.retained() > 0, "a survivor should be promoted");
        let reclaimed = policy.sweep();
        assert_eq!(policy.retained(), 0);
        assert!(reclaimed >= 100);
    }

    #[test]
    fn arena_frees_wholesale() {
        let mut policy = EpochArena::new(false);
        for _ in 0..10 {
            policy.retire(bytes(256));
        }
        assert_eq!(policy.retained(), 10);
        let reclaimed = policy.sweep();
        assert!(reclaimed >= 2560);
        assert_eq!(policy.retained(), 0);
    }

    #[test]
    fn build_rejects_mismatched_flags() {
        assert!(build_policy(PolicyKind::Direct, 1024, false, true).is_err());
        assert!(build_policy(PolicyKind::Arena, 1024, true, false).is_err());
        assert!(build_policy(PolicyKind::Deferred, 1024, true, false).is_ok());
    }

    #[cfg(not(feature = "compacting-arena"))]
    #[test]
    fn compact_unavailable_without_feature() {
        let err = build_policy(PolicyKind::Arena, 1024, false, true).unwrap_err();
        assert!(err.to_string().contains("not available in this build"));
    }
}
