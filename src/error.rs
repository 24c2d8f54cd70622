//! Error types of the stream codec and the reduction engine.
//!
//! The set algebra, numbers and tree generators are total and never fail.

use std::str::Utf8Error;

/// Failure while decoding a tree or term stream.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a record.
    #[error("Unexpected end of stream while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("Unknown tree discriminant: {0}")]
    BadDiscriminant(u8),

    #[error("Invalid UTF-8 in label: {0}")]
    InvalidLabel(#[from] Utf8Error),

    /// Labels are written with a 16-bit length prefix.
    #[error("Label of {0} bytes does not fit a 16-bit length")]
    LabelTooLong(usize),

    #[error("Negative array length: {0}")]
    NegativeLength(i32),
}

/// Failure of a parallel reduction. No partial total is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("A worker panicked while folding a term")]
    WorkerPanicked,

    #[error("Accumulator pool disconnected")]
    PoolDisconnected,

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
