//! Allocation/release pairing checks against the backend counters.
//!
//! These live in their own test binary so no unrelated test allocates
//! while a delta is being measured, and they serialize against each other
//! through a lock.

use hmem_core::{stats, Buffer, Residency};
use std::sync::Mutex;

static LOCK: Mutex<()> = Mutex::new(());

#[test]
fn test_double_allocate_releases_first_block() {
    let _guard = LOCK.lock().unwrap();

    let mut buf = Buffer::<u64>::alloc(100, Residency::Pageable).unwrap();
    let before = stats::snapshot();
    buf.allocate(200, Residency::Pageable).unwrap();
    let after = stats::snapshot();

    // One allocation, one release: the first block was freed and the live
    // count is unchanged.
    assert_eq!(after.live_allocations, before.live_allocations);
    assert_eq!(after.total_allocations, before.total_allocations + 1);
    assert_eq!(after.total_releases, before.total_releases + 1);
    assert_eq!(after.live_bytes, before.live_bytes + 800);
    assert_eq!(buf.len(), 200);
}

#[test]
fn test_drop_releases_exactly_once() {
    let _guard = LOCK.lock().unwrap();

    let before = stats::snapshot();
    {
        let _buf = Buffer::<u8>::alloc(4096, Residency::Pageable).unwrap();
        let held = stats::snapshot();
        assert_eq!(held.live_allocations, before.live_allocations + 1);
        assert_eq!(held.live_bytes, before.live_bytes + 4096);
    }
    let after = stats::snapshot();
    assert_eq!(after.live_allocations, before.live_allocations);
    assert_eq!(after.live_bytes, before.live_bytes);
}

#[test]
fn test_moved_out_buffer_drop_releases_nothing() {
    let _guard = LOCK.lock().unwrap();

    let mut buf = Buffer::<u8>::alloc(64, Residency::Pageable).unwrap();
    let moved = buf.take();
    let before = stats::snapshot();
    drop(buf);
    let after = stats::snapshot();
    assert_eq!(after.total_releases, before.total_releases);

    drop(moved);
    let end = stats::snapshot();
    assert_eq!(end.total_releases, before.total_releases + 1);
}

#[test]
fn test_adoption_registers_release_obligation() {
    let _guard = LOCK.lock().unwrap();

    let layout = std::alloc::Layout::array::<u32>(8).unwrap();
    let raw = unsafe { std::alloc::alloc(layout) as *mut u32 };
    assert!(!raw.is_null());

    let before = stats::snapshot();
    let buf = unsafe { Buffer::from_raw(raw, 8, Residency::Pageable).unwrap() };
    let held = stats::snapshot();
    assert_eq!(held.live_allocations, before.live_allocations + 1);

    drop(buf);
    let after = stats::snapshot();
    assert_eq!(after.live_allocations, before.live_allocations);
}

#[test]
fn test_failed_allocation_registers_no_obligation() {
    let _guard = LOCK.lock().unwrap();

    let before = stats::snapshot();
    assert!(Buffer::<u32>::alloc(0, Residency::Pageable).is_err());
    #[cfg(not(feature = "cuda"))]
    assert!(Buffer::<u32>::alloc(16, Residency::Device).is_err());
    let after = stats::snapshot();
    assert_eq!(after, before);
}
