//! Error types for the conversion pipeline.

use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised by a spectral transform provider.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Sample buffer does not match the configured block size.
    #[error("sample buffer holds {actual} samples, expected a block of {expected}")]
    BlockSize {
        /// Configured block size.
        expected: usize,
        /// Length of the buffer that was passed in.
        actual: usize,
    },

    /// The working buffer could not be allocated.
    #[error("failed to allocate FFT working buffer of {len} samples")]
    Allocation {
        /// Requested buffer length.
        len: usize,
    },
}

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The spectrum for the block could not be produced.
    #[error("spectral transform failed: {0}")]
    Transform(#[from] TransformError),

    /// The pitch set holds no usable scale degree to snap onto.
    #[error("failed to determine nearest scale degree for: {degree}")]
    NoNearestDegree {
        /// Scale degree that was being snapped.
        degree: u8,
    },
}
