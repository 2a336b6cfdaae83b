//! Error types for imgflip-core operations.
//!
//! # Usage
//!
//! ```rust
//! use imgflip_core::{Error, Image};
//!
//! let err = Image::from_f32(vec![0.0; 3], 2, 2, 1).unwrap_err();
//! assert!(matches!(err, Error::BufferSizeMismatch { expected: 4, actual: 3 }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or inspecting images.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Image dimensions are zero or would overflow a buffer.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Sample buffer does not match `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch {
        /// Expected sample count.
        expected: usize,
        /// Actual sample count.
        actual: usize,
    },

    /// Channel layout or depth not supported.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Name that is not a known flip mode.
    #[error("unknown flip mode: {0}")]
    InvalidMode(String),
}

impl Error {
    /// Convenience constructor for [`Error::InvalidDimensions`].
    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }
}
