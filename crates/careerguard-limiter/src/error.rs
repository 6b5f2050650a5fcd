//! Error types for the token guard.

use thiserror::Error;

/// Result type alias for limiter operations.
pub type Result<T> = std::result::Result<T, LimitError>;

/// Reasons a usage check is denied.
///
/// A denied check never mutates the user's record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// The call would push the window's token total past the cap.
    #[error("token cap exceeded: {used} used + {requested} requested > {limit}")]
    TokenCapExceeded {
        /// Tokens the denied call asked for
        requested: u64,
        /// Tokens already used in the current window
        used: u64,
        /// Tokens allowed per window
        limit: u64,
    },

    /// The call would push the window's request count past the cap.
    #[error("request cap exceeded: {used} requests already made (limit {limit})")]
    RequestCapExceeded {
        /// Requests already made in the current window
        used: u32,
        /// Requests allowed per window
        limit: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cap_display() {
        let err = LimitError::TokenCapExceeded {
            requested: 500,
            used: 9_800,
            limit: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("9800"));
        assert!(msg.contains("10000"));
    }

    #[test]
    fn test_request_cap_display() {
        let err = LimitError::RequestCapExceeded { used: 100, limit: 100 };
        assert!(err.to_string().contains("limit 100"));
    }
}
