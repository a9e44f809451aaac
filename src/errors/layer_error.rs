//! Layer construction error types.

use thiserror::Error;

/// Errors raised while building a layer from its configuration.
///
/// Forward passes do not return this type; shape or device mismatches there
/// surface as the tensor backend's own failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("Invalid layer configuration: {message}")]
    InvalidLayerConfig { message: String },
}

impl LayerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LayerError::InvalidLayerConfig {
            message: message.into(),
        }
    }

    /// Fails with [`LayerError::InvalidLayerConfig`] when `value` is zero.
    pub(crate) fn ensure_positive(name: &str, value: usize) -> Result<(), Self> {
        if value == 0 {
            return Err(Self::invalid(format!("{name} must be positive, got 0")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive() {
        assert!(LayerError::ensure_positive("kernel_size", 3).is_ok());

        let err = LayerError::ensure_positive("kernel_size", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid layer configuration: kernel_size must be positive, got 0"
        );
    }
}
