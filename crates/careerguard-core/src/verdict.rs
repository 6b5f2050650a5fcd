//! Verdict types for guard decisions.

use careerguard_limiter::LimitError;
use careerguard_safety::SensitiveKind;
use serde::{Deserialize, Serialize};

/// The outcome of screening a prompt or reviewing generated output.
///
/// - `Allow`: text is clean, proceed
/// - `Review`: text may proceed but carries flags worth logging
/// - `Block`: do not proceed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Passed every check.
    Allow {
        /// The sanitized text to use from here on.
        text: String,
    },

    /// Passed, with observations.
    Review {
        /// The sanitized text to use from here on.
        text: String,
        /// Why the text was flagged.
        flags: Vec<ReviewFlag>,
    },

    /// Failed a check.
    Block {
        /// The reason for blocking.
        reason: BlockReason,
    },
}

impl Verdict {
    /// Create an Allow verdict.
    pub fn allow(text: impl Into<String>) -> Self {
        Self::Allow { text: text.into() }
    }

    /// Create a Review verdict with the given flags.
    pub fn review(text: impl Into<String>, flags: Vec<ReviewFlag>) -> Self {
        Self::Review {
            text: text.into(),
            flags,
        }
    }

    /// Create a Block verdict with the given reason.
    pub fn block(reason: BlockReason) -> Self {
        Self::Block { reason }
    }

    /// Returns true if this is an Allow verdict.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Returns true if this is a Block verdict.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// Returns true if this carries review flags.
    pub fn requires_review(&self) -> bool {
        matches!(self, Self::Review { .. })
    }

    /// The text to proceed with, if not blocked.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Allow { text } | Self::Review { text, .. } => Some(text),
            Self::Block { .. } => None,
        }
    }
}

/// Reasons for blocking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockReason {
    /// Nothing left to send once the input was sanitized.
    EmptyInput,

    /// The user's token allowance for this window is spent.
    TokenCapExceeded {
        /// Tokens the call needed.
        requested: u64,
        /// Tokens already used.
        used: u64,
        /// Tokens allowed per window.
        limit: u64,
    },

    /// The user's request allowance for this window is spent.
    RequestCapExceeded {
        /// Requests already made.
        used: u32,
        /// Requests allowed per window.
        limit: u32,
    },

    /// Input carries personal data and the pipeline is set to refuse it.
    SensitiveData {
        /// Categories found.
        kinds: Vec<SensitiveKind>,
    },

    /// Generated text still contains a template placeholder.
    PlaceholderOutput {
        /// The marker found.
        marker: String,
    },
}

impl From<LimitError> for BlockReason {
    fn from(err: LimitError) -> Self {
        match err {
            LimitError::TokenCapExceeded {
                requested,
                used,
                limit,
            } => Self::TokenCapExceeded {
                requested,
                used,
                limit,
            },
            LimitError::RequestCapExceeded { used, limit } => {
                Self::RequestCapExceeded { used, limit }
            }
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Input is empty after sanitization"),
            Self::TokenCapExceeded { requested, used, limit } => write!(
                f,
                "Token limit reached: {} used, {} requested, {} per hour",
                used, requested, limit
            ),
            Self::RequestCapExceeded { used, limit } => {
                write!(f, "Request limit reached: {} of {} per hour", used, limit)
            }
            Self::SensitiveData { kinds } => {
                let labels: Vec<&str> = kinds.iter().map(SensitiveKind::label).collect();
                write!(f, "Sensitive data in input: {}", labels.join(", "))
            }
            Self::PlaceholderOutput { marker } => {
                write!(f, "Generated text contains placeholder '{}'", marker)
            }
        }
    }
}

/// Flags attached to a Review verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReviewFlag {
    /// Input looks like it carries personal data.
    SensitiveData {
        /// Categories found.
        kinds: Vec<SensitiveKind>,
    },

    /// The user has spent most of this window's token allowance.
    HighUsage {
        /// Percentage of the token cap used.
        percentage: u8,
    },
}
