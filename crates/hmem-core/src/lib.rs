//! hmem - Heterogeneous host/device memory buffers
//!
//! [`Buffer`] owns a contiguous array of trivially copyable elements in
//! one of four memory residencies (pageable host, pinned host, device,
//! managed) and handles allocation, migration, deep copy and binary
//! persistence. Without the `cuda` feature only pageable host memory is
//! available and every other residency is rejected at construction.

pub mod buffer;
pub mod dtype;
pub mod error;
pub mod residency;
pub mod stats;

mod alloc;
#[cfg(feature = "cuda")]
mod cuda;

pub use buffer::Buffer;
pub use dtype::{DType, Element};
pub use error::{Error, Result};
pub use residency::Residency;
pub use stats::AllocStats;
