//! Element type definitions

use crate::error::{Error, Result};

/// Supported element types
///
/// These are the per-element layouts the surrounding image-format layer can
/// produce; a file whose header declares anything else is rejected with
/// [`Error::UnsupportedDType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DType {
    UInt8 = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Float32 = 5,
    Float64 = 6,
}

impl DType {
    /// Size in bytes
    pub const fn size(&self) -> usize {
        match self {
            DType::UInt8 | DType::Int8 => 1,
            DType::Int16 => 2,
            DType::Int32 | DType::Float32 => 4,
            DType::Int64 | DType::Float64 => 8,
        }
    }

    /// Convert from u8
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(DType::UInt8),
            1 => Some(DType::Int8),
            2 => Some(DType::Int16),
            3 => Some(DType::Int32),
            4 => Some(DType::Int64),
            5 => Some(DType::Float32),
            6 => Some(DType::Float64),
            _ => None,
        }
    }

    /// Interpret a type code from an external source, rejecting unknown codes.
    pub fn from_code(v: u8) -> Result<Self> {
        Self::from_u8(v).ok_or(Error::UnsupportedDType(v))
    }
}

/// A trivially copyable element type with a known [`DType`] code.
///
/// The `Copy` bound is what lets the buffer move elements as raw bytes:
/// no constructors or destructors ever run on buffer contents.
pub trait Element: Copy + 'static {
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(impl Element for $ty {
            const DTYPE: DType = $dtype;
        })*
    };
}

impl_element! {
    u8 => DType::UInt8,
    i8 => DType::Int8,
    i16 => DType::Int16,
    i32 => DType::Int32,
    i64 => DType::Int64,
    f32 => DType::Float32,
    f64 => DType::Float64,
}
