//! Error types for the cluster-shaper system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the cluster-shaper system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (raised at construction, the object is unusable).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two sequences that must have the same length do not.
    #[error("Dimension mismatch: left has {left} elements, right has {right}")]
    DimensionMismatch {
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },

    /// Index outside of the valid range `[0, len - 1]`.
    #[error("Index {index} out of range for length {len}")]
    OutOfRange {
        /// Offending index.
        index: usize,
        /// Length of the sequence being indexed.
        len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(left: usize, right: usize) -> Self {
        Error::DimensionMismatch { left, right }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }

    /// Is this a configuration error?
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
