use thiserror::Error;

/// Buffer errors
#[derive(Debug, Error)]
pub enum BufferError {
    /// IO error from a file-backed storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Out-of-bounds access
    #[error("access of {len} bytes at offset {offset} exceeds buffer of {capacity} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("storage is read-only")]
    ReadOnly,

    #[error("unknown byte order {0:?} (expected \"LE\" or \"BE\")")]
    UnknownOrder(String),
}
