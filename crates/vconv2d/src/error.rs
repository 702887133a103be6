//! Error types for convolution dispatch.
//!
//! The row-block engine never fails: every error below is raised while a
//! call is being validated, before any output element is written.

use thiserror::Error;

/// Errors that can occur while dispatching a convolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvError {
    /// Filter size is not one of 1, 3, 5 or 7.
    #[error("Unsupported filter size: {0} (expected 1, 3, 5 or 7)")]
    UnsupportedFilterSize(usize),

    /// Tensor dimensions are inconsistent with the filter size.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// A buffer does not hold the number of elements the shape requires.
    #[error("{name} buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Lane or block configuration cannot be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Packed precision cannot be represented in the lane fields.
    #[error("Unsupported precision: {0}")]
    UnsupportedPrecision(String),

    /// Requested flush interval exceeds the overflow-safe maximum.
    #[error("Flush interval {requested} exceeds the overflow-safe maximum {max}")]
    FlushInterval { requested: usize, max: usize },
}

/// Result type for convolution dispatch.
pub type Result<T> = std::result::Result<T, ConvError>;
