//! Heap introspection for workload measurements.
//!
//! A counting wrapper around the system allocator maintains live/peak byte
//! counters; [`MemorySnapshot`] reads them together with the process resident
//! set. Snapshots are pure reads: nothing here triggers reclamation.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Global allocator wrapper that tracks live and peak heap bytes.
///
/// The binary installs this with `#[global_allocator]`; library unit tests run
/// without it, so tests assert on snapshot arithmetic rather than absolute
/// counter values.
pub struct CountingAllocator;

impl CountingAllocator {
    fn record_alloc(size: usize) {
        let live = LIVE_BYTES.fetch_add(size, Ordering::Relaxed) + size;
        PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
    }

    fn record_dealloc(size: usize) {
        LIVE_BYTES.fetch_sub(size, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            Self::record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        Self::record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            Self::record_dealloc(layout.size());
            Self::record_alloc(new_size);
        }
        new_ptr
    }
}

/// Live heap bytes as seen by the counting allocator.
pub fn heap_used() -> usize {
    LIVE_BYTES.load(Ordering::Relaxed)
}

/// High-water mark of live heap bytes.
pub fn heap_peak() -> usize {
    PEAK_BYTES.load(Ordering::Relaxed)
}

/// Resident set size of the current process in bytes, 0 where unsupported.
#[cfg(target_os = "linux")]
pub fn resident_bytes() -> u64 {
    let statm = match std::fs::read_to_string("/proc/self/statm") {
        Ok(s) => s,
        Err(_) => return 0,
    };
    let pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .and_then(|f| f.parse().ok())
        .unwrap_or(0);
    pages * 4096
}

#[cfg(not(target_os = "linux"))]
pub fn resident_bytes() -> u64 {
    0
}

/// Point-in-time read of heap and non-heap usage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemorySnapshot {
    pub heap_used: u64,
    pub heap_committed: u64,
    pub heap_max: u64,
    pub non_heap_used: u64,
    pub non_heap_committed: u64,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl MemorySnapshot {
    /// Capture current usage. `heap_max` is the configured ceiling for the
    /// run, carried through so reports can show headroom.
    pub fn capture(heap_max: u64) -> Self {
        let heap_used = heap_used() as u64;
        let heap_committed = heap_peak() as u64;
        let rss = resident_bytes();
        Self {
            heap_used,
            heap_committed,
            heap_max,
            non_heap_used: rss.saturating_sub(heap_used),
            non_heap_committed: rss,
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }

    /// Heap growth between two snapshots. Saturating: a collection between
    /// the snapshots can shrink the heap, which reads as zero growth.
    pub fn delta(before: &Self, after: &Self) -> u64 {
        after.heap_used.saturating_sub(before.heap_used)
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Human-readable byte count: >= 1 GiB in GB, >= 1 MiB in MB, >= 1 KiB in KB,
/// otherwise raw bytes.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}
