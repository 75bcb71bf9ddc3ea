//! Heterogeneous memory buffer

use crate::alloc;
use crate::error::{Error, Result};
use crate::residency::Residency;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::ptr::NonNull;

/// A contiguous array of `T` in host, pinned, device or managed memory.
///
/// The buffer exclusively owns its storage: dropping it releases the block
/// with the strategy matching its [`Residency`], moving it transfers the
/// block, and [`Buffer::try_clone`] deep-copies it. `T: Copy` means
/// contents are moved as raw bytes only.
///
/// A buffer is not internally synchronized. `&mut` exclusivity already
/// forbids concurrent mutation of one instance; distinct instances are
/// independent and may be used from different threads.
pub struct Buffer<T: Copy> {
    ptr: Option<NonNull<T>>,
    len: usize,
    residency: Residency,
}

// Safety: the buffer is the sole owner of its storage and hands out
// references only through &self/&mut self, so Send/Sync reduce to T's.
unsafe impl<T: Copy + Send> Send for Buffer<T> {}
unsafe impl<T: Copy + Sync> Sync for Buffer<T> {}

impl<T: Copy> Buffer<T> {
    /// Create an empty buffer with no storage.
    pub fn new() -> Self {
        Self {
            ptr: None,
            len: 0,
            residency: Residency::Pageable,
        }
    }

    /// Allocate a zero-initialized buffer of `n` elements under `residency`.
    pub fn alloc(n: usize, residency: Residency) -> Result<Self> {
        let mut buf = Self::new();
        buf.allocate(n, residency)?;
        Ok(buf)
    }

    /// Adopt a pre-allocated block of `n` elements, taking exclusive
    /// ownership without copying.
    ///
    /// Rejects a null `ptr`, `n == 0`, and any residency unsupported on
    /// this build.
    ///
    /// # Safety
    ///
    /// `ptr` must have been produced by the allocator matching `residency`
    /// (the global Rust allocator with `Layout::array::<T>(n)` for
    /// [`Residency::Pageable`], the corresponding driver allocator
    /// otherwise) for exactly `n` elements, and nothing else may free it.
    pub unsafe fn from_raw(ptr: *mut T, n: usize, residency: Residency) -> Result<Self> {
        if !residency.is_supported() {
            return Err(Error::UnsupportedResidency { residency });
        }
        if n == 0 {
            return Err(Error::InvalidArgument(
                "from_raw: element count must be positive".to_string(),
            ));
        }
        let ptr = NonNull::new(ptr).ok_or_else(|| {
            Error::InvalidArgument("from_raw: will not adopt a null pointer".to_string())
        })?;
        // Adoption transfers the release obligation to this buffer, so it
        // counts as an allocation event.
        crate::stats::record_alloc(n * std::mem::size_of::<T>());
        Ok(Self {
            ptr: Some(ptr),
            len: n,
            residency,
        })
    }

    /// Allocate zero-initialized storage for `n` elements, replacing any
    /// current storage.
    ///
    /// The new block is allocated before the old one is released, so a
    /// failure leaves the buffer exactly as it was. The old block is
    /// always released on success, never leaked.
    pub fn allocate(&mut self, n: usize, residency: Residency) -> Result<()> {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "allocate: element count must be positive".to_string(),
            ));
        }
        let fresh = alloc::alloc_raw::<T>(n, residency)?;
        self.release();
        self.ptr = Some(fresh);
        self.len = n;
        self.residency = residency;
        Ok(())
    }

    /// Release current storage, if any, and return to the empty state.
    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            alloc::release_raw(ptr, self.len, self.residency);
        }
        self.len = 0;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no storage.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Current residency tag. Meaningful only when non-empty.
    pub fn residency(&self) -> Residency {
        self.residency
    }

    /// `true` if storage lives in accelerator device memory.
    pub fn is_on_device(&self) -> bool {
        self.residency == Residency::Device
    }

    /// `true` if storage is page-locked host memory.
    pub fn is_pinned(&self) -> bool {
        self.residency == Residency::Pinned
    }

    /// Raw pointer to the storage, null when empty.
    ///
    /// Unchecked by design: for a device-resident buffer the pointer is
    /// only valid for device-side access, and nothing here stops host code
    /// from dereferencing it anyway.
    pub fn as_ptr(&self) -> *const T {
        self.ptr
            .map_or(std::ptr::null(), |p| p.as_ptr() as *const T)
    }

    /// Mutable raw pointer to the storage, null when empty.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.map_or(std::ptr::null_mut(), NonNull::as_ptr)
    }

    /// View the elements from host code.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is device-resident; a safe slice over memory
    /// the host cannot dereference would be unsound. Call
    /// [`Buffer::to_host`] first.
    pub fn host_slice(&self) -> &[T] {
        let Some(ptr) = self.ptr else { return &[] };
        assert!(
            self.residency.is_host_accessible(),
            "host access to device-resident buffer"
        );
        unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.len) }
    }

    /// Mutable host view of the elements. Panics like [`Buffer::host_slice`].
    pub fn host_slice_mut(&mut self) -> &mut [T] {
        let Some(ptr) = self.ptr else { return &mut [] };
        assert!(
            self.residency.is_host_accessible(),
            "host access to device-resident buffer"
        );
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.len) }
    }

    /// Bounds-checked element access through the host view.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.host_slice().get(i)
    }

    /// Bounds-checked mutable element access through the host view.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        self.host_slice_mut().get_mut(i)
    }

    /// Move the contents out, leaving this buffer empty.
    ///
    /// The returned buffer carries the storage, count and residency; the
    /// drop of the emptied source releases nothing.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Deep-copy into a new buffer of the same residency.
    ///
    /// The copy is fully independent: mutating one buffer never affects
    /// the other.
    pub fn try_clone(&self) -> Result<Self> {
        let Some(src) = self.ptr else { return Ok(Self::new()) };
        let fresh = alloc::alloc_raw::<T>(self.len, self.residency)?;
        if let Err(e) = alloc::copy_same_residency(fresh, src, self.len, self.residency) {
            alloc::release_raw(fresh, self.len, self.residency);
            return Err(e);
        }
        Ok(Self {
            ptr: Some(fresh),
            len: self.len,
            residency: self.residency,
        })
    }

    /// Migrate device-resident storage to pageable host memory.
    ///
    /// No-op when the buffer is already host-accessible (pageable, pinned
    /// or managed) or empty; calling it twice is the same as calling it
    /// once.
    pub fn to_host(&mut self) -> Result<()> {
        self.to_host_as(Residency::Pageable)
    }

    /// Migrate device-resident storage to the given host residency.
    ///
    /// `target` must be [`Residency::Pageable`] or [`Residency::Pinned`].
    pub fn to_host_as(&mut self, target: Residency) -> Result<()> {
        if !matches!(target, Residency::Pageable | Residency::Pinned) {
            return Err(Error::InvalidArgument(format!(
                "to_host: target must be a host residency, got {}",
                target
            )));
        }
        #[cfg(feature = "cuda")]
        if self.residency == Residency::Device {
            let Some(old) = self.ptr else { return Ok(()) };
            let n = self.len;
            let fresh = alloc::alloc_raw::<T>(n, target)?;
            let bytes = n * std::mem::size_of::<T>();
            if let Err(e) =
                crate::cuda::copy_dtoh(fresh.as_ptr() as *mut u8, old.as_ptr() as *const u8, bytes)
            {
                alloc::release_raw(fresh, n, target);
                return Err(e);
            }
            alloc::release_raw(old, n, Residency::Device);
            self.ptr = Some(fresh);
            self.residency = target;
            tracing::debug!(elements = n, %target, "migrated buffer to host");
        }
        Ok(())
    }

    /// Migrate storage to accelerator device memory.
    ///
    /// No-op when already device-resident, when empty, or on a build
    /// without accelerator support (only host residency exists there).
    pub fn to_device(&mut self) -> Result<()> {
        #[cfg(feature = "cuda")]
        if self.residency != Residency::Device {
            let Some(old) = self.ptr else { return Ok(()) };
            let n = self.len;
            let fresh = alloc::alloc_raw::<T>(n, Residency::Device)?;
            let bytes = n * std::mem::size_of::<T>();
            let copied = match self.residency {
                // A managed pointer is addressable from both sides; let
                // the driver resolve the direction.
                Residency::Managed => crate::cuda::copy_unified(
                    fresh.as_ptr() as *mut u8,
                    old.as_ptr() as *const u8,
                    bytes,
                ),
                _ => crate::cuda::copy_htod(
                    fresh.as_ptr() as *mut u8,
                    old.as_ptr() as *const u8,
                    bytes,
                ),
            };
            if let Err(e) = copied {
                alloc::release_raw(fresh, n, Residency::Device);
                return Err(e);
            }
            alloc::release_raw(old, n, self.residency);
            self.ptr = Some(fresh);
            self.residency = Residency::Device;
            tracing::debug!(elements = n, "migrated buffer to device");
        }
        Ok(())
    }

    /// Write the contents to a file as headerless native-endian bytes.
    ///
    /// Device-resident buffers are migrated to pageable host memory first,
    /// and stay there afterwards. The file carries no element type or
    /// count metadata.
    pub fn dump(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.to_host()?;
        let view = self.host_slice();
        let bytes = unsafe {
            std::slice::from_raw_parts(
                view.as_ptr() as *const u8,
                view.len() * std::mem::size_of::<T>(),
            )
        };
        let mut file = File::create(path.as_ref()).map_err(|e| Error::Io {
            op: "dump",
            source: e,
        })?;
        file.write_all(bytes).map_err(|e| Error::Io {
            op: "dump",
            source: e,
        })?;
        tracing::debug!(bytes = bytes.len(), path = %path.as_ref().display(), "dumped buffer");
        Ok(())
    }

    /// Load a host-resident buffer from a file written by [`Buffer::dump`].
    ///
    /// The element count is `file size / size_of::<T>()`; trailing bytes
    /// that do not fill a whole element are discarded. A file holding
    /// fewer bytes than one element is an invalid argument.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let elem = std::mem::size_of::<T>();
        if elem == 0 {
            return Err(Error::InvalidArgument(
                "load: zero-sized element types cannot be stored in a buffer".to_string(),
            ));
        }
        let raw = std::fs::read(path.as_ref()).map_err(|e| Error::Io {
            op: "load",
            source: e,
        })?;
        let n = raw.len() / elem;
        if n == 0 {
            return Err(Error::InvalidArgument(format!(
                "load: file holds {} bytes, less than one {}-byte element",
                raw.len(),
                elem
            )));
        }
        if raw.len() % elem != 0 {
            tracing::debug!(
                discarded = raw.len() % elem,
                "file size is not a whole number of elements"
            );
        }
        let mut buf = Self::alloc(n, Residency::Pageable)?;
        // The Vec's allocation cannot be adopted directly: its layout is
        // that of u8, not T. Re-home the bytes into buffer storage.
        unsafe {
            std::ptr::copy_nonoverlapping(raw.as_ptr(), buf.as_mut_ptr() as *mut u8, n * elem);
        }
        tracing::debug!(elements = n, path = %path.as_ref().display(), "loaded buffer");
        Ok(buf)
    }
}

impl<T: Copy> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Drop for Buffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Copy> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("residency", &self.residency)
            .finish()
    }
}
