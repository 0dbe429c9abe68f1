use struct_buffer::BufferError;
use thiserror::Error;

use crate::pointer::Address;

/// Errors raised while measuring, packing or unpacking a [`Struct`](crate::Struct).
///
/// Every error aborts the whole call; the target buffer or record is left in an
/// unspecified state.
#[derive(Debug, Error)]
pub enum StructError {
    /// A field is missing or holds a value of the wrong type.
    #[error("expected {expected} for key {key}, but got {found} instead")]
    Shape {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// An array or string has a different length than the schema declares.
    #[error("expected length {expected} for key {key}, but got {found} instead")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    /// A cursor would leave its `[start, end)` window.
    #[error("access of {len} bytes at position {position} leaves window [{start}, {end})")]
    OutOfWindow {
        position: usize,
        len: usize,
        start: usize,
        end: usize,
    },

    /// A cursor window that cannot exist in the buffer.
    #[error("invalid window [{start}, {end}) over a buffer of {capacity} bytes")]
    InvalidWindow {
        start: usize,
        end: usize,
        capacity: usize,
    },

    #[error("address {address} does not fit in an {width} pointer")]
    AddressOverflow { address: i64, width: Address },

    #[error("cannot align to a multiple of {0}")]
    InvalidAlignment(usize),

    /// Unpacked bytes differ from a literal's constant.
    #[error("failed to match literal value: expected {expected}, got {found}")]
    LiteralMismatch { expected: String, found: String },

    /// A datatype or operation the core does not implement.
    #[error("unrecognized {0}")]
    Unrecognized(String),

    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, StructError>;
