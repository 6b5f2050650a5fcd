//! Error types for CareerGuard Core.

use thiserror::Error;

use crate::validation::ValidationError;
use crate::verdict::BlockReason;

/// Core error type for guard operations.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Form input failed validation.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The pipeline refused the request or the generated output.
    #[error("Blocked: {0}")]
    Blocked(BlockReason),

    /// The external text generator failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store error passthrough.
    #[error("Store error: {0}")]
    Store(#[from] careerguard_store::StoreError),
}

/// Failure reported by a [`TextGenerator`](crate::TextGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GenerationError(pub String);

impl GenerationError {
    /// Wraps any displayable error.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_display() {
        let err = GuardError::Blocked(BlockReason::EmptyInput);
        assert_eq!(err.to_string(), "Blocked: Input is empty after sanitization");
    }

    #[test]
    fn test_generation_passthrough() {
        let err: GuardError = GenerationError::new("upstream 503").into();
        assert!(err.to_string().contains("upstream 503"));
    }

    #[test]
    fn test_validation_passthrough() {
        let err: GuardError = ValidationError::MissingField("company_name").into();
        assert!(err.to_string().contains("company_name"));
    }
}
