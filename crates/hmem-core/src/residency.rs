//! Memory residency tags

use std::fmt;

/// Where a buffer's storage currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Residency {
    /// Ordinary host memory from the global allocator.
    Pageable = 0,
    /// Page-locked host memory, faster for device transfers.
    Pinned = 1,
    /// Accelerator device memory, not dereferenceable from host code.
    Device = 2,
    /// Unified memory visible to both host and device.
    Managed = 3,
}

impl Residency {
    /// Whether this build carries accelerator support at all.
    pub const fn accelerator_enabled() -> bool {
        cfg!(feature = "cuda")
    }

    /// Whether this residency can be allocated on the current build.
    ///
    /// Only [`Residency::Pageable`] is available without the `cuda` feature.
    pub const fn is_supported(self) -> bool {
        matches!(self, Residency::Pageable) || Self::accelerator_enabled()
    }

    /// Whether storage under this residency may be dereferenced from host code.
    pub const fn is_host_accessible(self) -> bool {
        !matches!(self, Residency::Device)
    }

    /// Convert from u8
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Residency::Pageable),
            1 => Some(Residency::Pinned),
            2 => Some(Residency::Device),
            3 => Some(Residency::Managed),
            _ => None,
        }
    }
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Residency::Pageable => "pageable",
            Residency::Pinned => "pinned",
            Residency::Device => "device",
            Residency::Managed => "managed",
        };
        f.write_str(name)
    }
}
