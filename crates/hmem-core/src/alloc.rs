//! Residency-aware allocation backend
//!
//! Single dispatch point for allocating, releasing and copying storage in
//! every residency. All ownership paths in the crate (drop, re-allocation,
//! migration) release through [`release_raw`], so there is exactly one
//! free routine per residency.

use crate::error::{Error, Result};
use crate::residency::Residency;
use crate::stats;
use std::alloc::Layout;
use std::ptr::NonNull;

fn layout_for<T>(n: usize) -> Result<Layout> {
    if std::mem::size_of::<T>() == 0 {
        return Err(Error::InvalidArgument(
            "zero-sized element types cannot be stored in a buffer".to_string(),
        ));
    }
    Layout::array::<T>(n).map_err(|_| {
        Error::InvalidArgument(format!("{} elements overflow the address space", n))
    })
}

/// Allocate zero-initialized storage for `n` elements under `residency`.
///
/// Requires `n > 0`. A failed allocation registers no ownership obligation:
/// the caller only becomes responsible for a release on `Ok`.
///
/// Host-dereferenceable storage must come back zeroed: the safe host views
/// hand out `&[T]` immediately after allocation, and a reference to
/// uninitialized memory is undefined behavior. Device storage is exempt —
/// it is never host-readable without a migration, which overwrites it.
pub(crate) fn alloc_raw<T: Copy>(n: usize, residency: Residency) -> Result<NonNull<T>> {
    debug_assert!(n > 0);
    if !residency.is_supported() {
        return Err(Error::UnsupportedResidency { residency });
    }
    let layout = layout_for::<T>(n)?;
    let bytes = layout.size();

    let raw: *mut T = match residency {
        Residency::Pageable => unsafe { std::alloc::alloc_zeroed(layout) as *mut T },
        #[cfg(feature = "cuda")]
        Residency::Pinned => {
            let p = crate::cuda::alloc_pinned(bytes)?;
            unsafe { std::ptr::write_bytes(p, 0, bytes) };
            p as *mut T
        }
        #[cfg(feature = "cuda")]
        Residency::Device => crate::cuda::alloc_device(bytes)? as *mut T,
        #[cfg(feature = "cuda")]
        Residency::Managed => {
            let p = crate::cuda::alloc_managed(bytes)?;
            unsafe { std::ptr::write_bytes(p, 0, bytes) };
            p as *mut T
        }
        #[cfg(not(feature = "cuda"))]
        other => return Err(Error::UnsupportedResidency { residency: other }),
    };

    let ptr = NonNull::new(raw).ok_or(Error::AllocationFailed { bytes, residency })?;
    stats::record_alloc(bytes);
    tracing::trace!(bytes, %residency, "allocated storage");
    Ok(ptr)
}

/// Release storage previously produced by [`alloc_raw`] (or adopted with
/// the same residency and count).
///
/// Infallible by contract: a CUDA free that reports an error is logged and
/// the pointer is abandoned, matching drop semantics.
pub(crate) fn release_raw<T>(ptr: NonNull<T>, n: usize, residency: Residency) {
    let bytes = n * std::mem::size_of::<T>();
    match residency {
        Residency::Pageable => {
            // The layout was validated at allocation time; failing here
            // would desynchronize the counters, so assert the invariant.
            match Layout::array::<T>(n) {
                Ok(layout) => unsafe { std::alloc::dealloc(ptr.as_ptr() as *mut u8, layout) },
                Err(_) => unreachable!("layout was validated at allocation time"),
            }
        }
        #[cfg(feature = "cuda")]
        Residency::Pinned => {
            if let Err(e) = crate::cuda::free_pinned(ptr.as_ptr() as *mut u8) {
                tracing::debug!(error = %e, "pinned free failed");
            }
        }
        #[cfg(feature = "cuda")]
        Residency::Device | Residency::Managed => {
            if let Err(e) = crate::cuda::free_device(ptr.as_ptr() as *mut u8) {
                tracing::debug!(error = %e, "device free failed");
            }
        }
        #[cfg(not(feature = "cuda"))]
        _ => {
            // Unreachable: such storage can never be allocated or adopted
            // on this build.
            tracing::debug!(%residency, "release of unsupported residency ignored");
        }
    }
    stats::record_release(bytes);
    tracing::trace!(bytes, %residency, "released storage");
}

/// Byte copy between two blocks that share one residency.
///
/// Host-accessible residencies copy through the CPU; device storage goes
/// through the driver. Blocks must not overlap.
pub(crate) fn copy_same_residency<T: Copy>(
    dst: NonNull<T>,
    src: NonNull<T>,
    n: usize,
    residency: Residency,
) -> Result<()> {
    match residency {
        #[cfg(feature = "cuda")]
        Residency::Device => {
            let bytes = n * std::mem::size_of::<T>();
            crate::cuda::copy_dtod(dst.as_ptr() as *mut u8, src.as_ptr() as *const u8, bytes)
        }
        _ => {
            unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), n) };
            Ok(())
        }
    }
}
