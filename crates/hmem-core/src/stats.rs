//! Process-wide allocation counters
//!
//! Every allocation and release performed by the residency backend is
//! recorded here, so tests (and leak hunts) can observe that the two stay
//! paired without hooking the global allocator.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

static LIVE_ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static TOTAL_ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static TOTAL_RELEASES: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the backend's allocation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    pub live_allocations: usize,
    pub live_bytes: usize,
    pub total_allocations: u64,
    pub total_releases: u64,
}

/// Read the current counters.
///
/// Counters are process-wide; tests that assert on deltas should compare
/// two snapshots rather than absolute values.
pub fn snapshot() -> AllocStats {
    AllocStats {
        live_allocations: LIVE_ALLOCATIONS.load(Ordering::Relaxed),
        live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
        total_allocations: TOTAL_ALLOCATIONS.load(Ordering::Relaxed),
        total_releases: TOTAL_RELEASES.load(Ordering::Relaxed),
    }
}

pub(crate) fn record_alloc(bytes: usize) {
    LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    LIVE_BYTES.fetch_add(bytes, Ordering::Relaxed);
    TOTAL_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_release(bytes: usize) {
    LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
    LIVE_BYTES.fetch_sub(bytes, Ordering::Relaxed);
    TOTAL_RELEASES.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide, so other tests in this binary may move
    // them concurrently; assert monotonic effects only. Exact pairing is
    // checked in the dedicated alloc_tracking integration binary.
    #[test]
    fn test_counters_are_monotonic() {
        let before = snapshot();
        record_alloc(128);
        record_alloc(64);
        record_release(64);
        record_release(128);
        let after = snapshot();
        assert!(after.total_allocations >= before.total_allocations + 2);
        assert!(after.total_releases >= before.total_releases + 2);
    }
}
