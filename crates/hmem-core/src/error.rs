//! Error types for hmem

use crate::residency::Residency;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("allocation of {bytes} bytes in {residency} memory failed")]
    AllocationFailed { bytes: usize, residency: Residency },

    #[error("{residency} memory is unavailable on a build without accelerator support")]
    UnsupportedResidency { residency: Residency },

    #[error("unknown element type code: {0}")]
    UnsupportedDType(u8),

    #[error("I/O error during {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "cuda")]
    #[error("CUDA error: {0}")]
    Cuda(String),
}

pub type Result<T> = std::result::Result<T, Error>;
