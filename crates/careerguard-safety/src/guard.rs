//! Main safety facade
//!
//! Combines the markup disarm, sensitive-data detection and output
//! validation into the interface the request pipeline calls.

use regex::Regex;
use tracing::debug;

use crate::models::{SafetyConfig, SensitiveKind};
use crate::sanitize::{truncate_chars, Disarm};

/// Sensitive-data pattern with its category
struct SensitivePattern {
    pattern: Regex,
    kind: SensitiveKind,
}

/// The safety guard - main interface
pub struct SafetyGuard {
    config: SafetyConfig,
    disarm: Disarm,
    sensitive: Vec<SensitivePattern>,
}

impl SafetyGuard {
    /// Create a new guard with default config
    pub fn new() -> Self {
        Self::with_config(SafetyConfig::default())
    }

    /// Create a guard with custom config
    pub fn with_config(config: SafetyConfig) -> Self {
        Self {
            config,
            disarm: Disarm::new(),
            sensitive: Self::build_patterns(),
        }
    }

    /// Get the active configuration
    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Build regex patterns for sensitive data detection
    fn build_patterns() -> Vec<SensitivePattern> {
        let table = [
            (r"\b\d{3}-\d{2}-\d{4}\b", SensitiveKind::Ssn),
            (r"\b\d{16}\b", SensitiveKind::CardNumber),
            (r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}", SensitiveKind::Email),
            (r"\b(?:\d{1,3}\.){3}\d{1,3}\b", SensitiveKind::Ipv4Address),
        ];

        table
            .iter()
            .map(|(pattern, kind)| SensitivePattern {
                pattern: Regex::new(pattern).expect("built-in sensitive pattern is valid"),
                kind: *kind,
            })
            .collect()
    }

    /// Sanitize free-text input before it is stored or sent to a model.
    ///
    /// Removes script tags, inline event handlers and `javascript:`,
    /// `vbscript:` and `data:` schemes, truncates to
    /// [`SafetyConfig::max_input_chars`] characters and trims surrounding
    /// whitespace.
    ///
    /// # Security Note
    ///
    /// Best-effort pattern stripping only. See [`crate::sanitize`] for what
    /// it does not catch; never render the result as trusted HTML.
    pub fn sanitize_input(&self, text: &str) -> String {
        // Disarm cost grows with nesting depth, so cap the work up front
        let bounded = truncate_chars(text, self.config.max_input_chars.saturating_mul(4));
        let disarmed = self.disarm.apply(bounded);
        let truncated = truncate_chars(&disarmed, self.config.max_input_chars);
        let out = truncated.trim().to_string();

        if out.len() != text.len() {
            debug!(
                "Sanitized input: {} -> {} bytes",
                text.len(),
                out.len()
            );
        }
        out
    }

    /// Sanitize an untyped form field. Anything but a JSON string yields `""`.
    pub fn sanitize_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(text) => self.sanitize_input(text),
            _ => String::new(),
        }
    }

    /// Check whether text looks like it carries personal data.
    pub fn contains_sensitive_info(&self, text: &str) -> bool {
        self.sensitive.iter().any(|p| p.pattern.is_match(text))
    }

    /// List every sensitive category present in `text`, in detection order.
    pub fn detect_sensitive(&self, text: &str) -> Vec<SensitiveKind> {
        self.sensitive
            .iter()
            .filter(|p| p.pattern.is_match(text))
            .map(|p| p.kind)
            .collect()
    }

    /// Check generated text for unfilled template placeholders.
    ///
    /// Returns `false` if any configured marker occurs in `text`.
    pub fn validate_output(&self, text: &str) -> bool {
        self.find_placeholder(text).is_none()
    }

    /// Return the first placeholder marker found in `text`.
    pub fn find_placeholder(&self, text: &str) -> Option<&str> {
        self.config
            .placeholder_markers
            .iter()
            .find(|marker| text.contains(marker.as_str()))
            .map(String::as_str)
    }
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::new()
    }
}
