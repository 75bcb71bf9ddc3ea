//! CUDA driver helpers for device, pinned and managed storage
//!
//! Thin wrappers over the raw driver API. All transfers are synchronous:
//! callers block until the copy has completed, no streams are exposed.

use crate::{Error, Result};
use cudarc::driver::sys;
use cudarc::driver::CudaDevice;
use std::ffi::c_void;
use std::sync::{Arc, OnceLock};

static DEVICE: OnceLock<Arc<CudaDevice>> = OnceLock::new();

/// Bind the primary context of device 0, once per process.
///
/// Every allocation and transfer path calls this first; holding the
/// `CudaDevice` in a static keeps the context alive for the lifetime of
/// all buffers.
pub(crate) fn ensure_context() -> Result<()> {
    if DEVICE.get().is_some() {
        return Ok(());
    }
    let device = CudaDevice::new(0).map_err(|e| Error::Cuda(e.to_string()))?;
    let _ = DEVICE.set(device);
    Ok(())
}

fn check(result: sys::CUresult, what: &str) -> Result<()> {
    if result != sys::CUresult::CUDA_SUCCESS {
        return Err(Error::Cuda(format!("{} failed: {:?}", what, result)));
    }
    Ok(())
}

/// Allocate device memory. The returned pointer is only valid for
/// device-side access and driver memcpy calls.
pub(crate) fn alloc_device(bytes: usize) -> Result<*mut u8> {
    ensure_context()?;
    let mut dptr: sys::CUdeviceptr = 0;
    unsafe {
        check(sys::cuMemAlloc_v2(&mut dptr, bytes), "cuMemAlloc")?;
    }
    Ok(dptr as *mut u8)
}

/// Allocate page-locked host memory.
pub(crate) fn alloc_pinned(bytes: usize) -> Result<*mut u8> {
    ensure_context()?;
    let mut ptr: *mut c_void = std::ptr::null_mut();
    unsafe {
        check(sys::cuMemAllocHost_v2(&mut ptr, bytes), "cuMemAllocHost")?;
    }
    Ok(ptr as *mut u8)
}

/// Allocate unified memory attached globally (visible to host and device).
pub(crate) fn alloc_managed(bytes: usize) -> Result<*mut u8> {
    ensure_context()?;
    let mut dptr: sys::CUdeviceptr = 0;
    unsafe {
        check(
            sys::cuMemAllocManaged(
                &mut dptr,
                bytes,
                sys::CUmemAttach_flags::CU_MEM_ATTACH_GLOBAL as u32,
            ),
            "cuMemAllocManaged",
        )?;
    }
    Ok(dptr as *mut u8)
}

/// Free device or managed memory.
pub(crate) fn free_device(ptr: *mut u8) -> Result<()> {
    unsafe { check(sys::cuMemFree_v2(ptr as sys::CUdeviceptr), "cuMemFree") }
}

/// Free page-locked host memory.
pub(crate) fn free_pinned(ptr: *mut u8) -> Result<()> {
    unsafe { check(sys::cuMemFreeHost(ptr as *mut c_void), "cuMemFreeHost") }
}

pub(crate) fn copy_htod(dst: *mut u8, src: *const u8, bytes: usize) -> Result<()> {
    unsafe {
        check(
            sys::cuMemcpyHtoD_v2(dst as sys::CUdeviceptr, src as *const c_void, bytes),
            "cuMemcpyHtoD",
        )
    }
}

pub(crate) fn copy_dtoh(dst: *mut u8, src: *const u8, bytes: usize) -> Result<()> {
    unsafe {
        check(
            sys::cuMemcpyDtoH_v2(dst as *mut c_void, src as sys::CUdeviceptr, bytes),
            "cuMemcpyDtoH",
        )
    }
}

pub(crate) fn copy_dtod(dst: *mut u8, src: *const u8, bytes: usize) -> Result<()> {
    unsafe {
        check(
            sys::cuMemcpyDtoD_v2(dst as sys::CUdeviceptr, src as sys::CUdeviceptr, bytes),
            "cuMemcpyDtoD",
        )
    }
}

/// Unified copy that lets the driver resolve pointer domains. Used for
/// managed-to-device transfers, where the source is addressable from both
/// sides.
pub(crate) fn copy_unified(dst: *mut u8, src: *const u8, bytes: usize) -> Result<()> {
    unsafe {
        check(
            sys::cuMemcpy(dst as sys::CUdeviceptr, src as sys::CUdeviceptr, bytes),
            "cuMemcpy",
        )
    }
}
