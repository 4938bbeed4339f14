//! Error types for pixaug_core.

use thiserror::Error;

/// Result type alias using [`AugmentError`].
pub type Result<T> = std::result::Result<T, AugmentError>;

/// Errors raised while configuring or running an augmentation pipeline.
///
/// Every variant aborts the current call; nothing is retried and no default
/// is substituted.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// Two mutually exclusive parameters were both set, or a parameter is
    /// outside its valid range.
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// The source is smaller than the region the configuration requires.
    #[error(
        "Insufficient source dimensions: need at least {required}x{required}, got {height}x{width} (HxW)"
    )]
    InsufficientSourceDimensions {
        /// Required side length.
        required: usize,
        /// Source height.
        height: usize,
        /// Source width.
        width: usize,
    },

    /// The pixel buffer is not 8-bit unsigned.
    #[error("Invalid pixel depth: {0}")]
    InvalidPixelDepth(String),

    /// A compressed sample was given but no decoder is available.
    #[error("Encoded input requires the `decode` feature")]
    UnsupportedEncodedInput,

    /// A random draw was requested from a transformer without a generator.
    #[error("Random source unavailable: this transformer was built without randomization")]
    RandomSourceUnavailable,

    /// Destination tensor or batch shape is incompatible.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The sample decoder rejected the payload.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AugmentError {
    /// Shorthand for [`AugmentError::ShapeMismatch`].
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Shorthand for [`AugmentError::ConfigurationConflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConfigurationConflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AugmentError::InsufficientSourceDimensions {
            required: 100,
            height: 80,
            width: 120,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient source dimensions: need at least 100x100, got 80x120 (HxW)"
        );

        let err = AugmentError::conflict("mean_file and mean_value");
        assert!(err.to_string().contains("mean_file and mean_value"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AugmentError = io.into();
        assert!(matches!(err, AugmentError::IoError(_)));
    }
}
