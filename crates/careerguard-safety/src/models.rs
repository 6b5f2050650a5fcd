//! # Core Types for the Safety Guard
//!
//! Classification of the sensitive data categories the guard can detect,
//! and the configuration shared by the sanitizer and the output validator.

use serde::{Deserialize, Serialize};

/// Default character budget for sanitized input.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

/// Placeholder markers that must never reach an end user.
///
/// Their presence in generated text means the model echoed a template slot
/// instead of filling it.
pub const DEFAULT_PLACEHOLDER_MARKERS: &[&str] = &[
    "[REDACTED]",
    "[PLACEHOLDER]",
    "[INSERT",
    "[YOUR NAME]",
    "[COMPANY NAME]",
];

/// Categories of sensitive personal data recognised in free text.
///
/// | Variant | Shape |
/// |---------|-------|
/// | `Ssn` | `123-45-6789` |
/// | `CardNumber` | 16 contiguous digits |
/// | `Email` | `local@domain.tld` |
/// | `Ipv4Address` | four dotted decimal groups |
///
/// Detection is purely lexical. A match means "looks like", not "is".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensitiveKind {
    /// US social security number.
    Ssn,
    /// Payment card number.
    CardNumber,
    /// Email address.
    Email,
    /// IPv4 address.
    Ipv4Address,
}

impl SensitiveKind {
    /// Short human-readable label, suitable for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            SensitiveKind::Ssn => "social security number",
            SensitiveKind::CardNumber => "card number",
            SensitiveKind::Email => "email address",
            SensitiveKind::Ipv4Address => "IPv4 address",
        }
    }
}

impl std::fmt::Display for SensitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Safety Guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Sanitized input is truncated to this many characters.
    pub max_input_chars: usize,
    /// Output containing any of these substrings fails validation.
    pub placeholder_markers: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            placeholder_markers: DEFAULT_PLACEHOLDER_MARKERS
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
        }
    }
}
