//! # CareerGuard Safety - Text Hygiene Layer
//!
//! The Safety Guard sits on both sides of every AI call made on behalf of a
//! user: free-text form input is disarmed before it is stored or sent to a
//! model, and generated text is checked before it is shown.
//!
//! ## Capabilities
//!
//! 1. **Input sanitization** - Strips script tags, inline event handlers and
//!    script-capable URI schemes, then truncates and trims.
//!
//! 2. **Sensitive data detection** - Flags text that looks like it carries
//!    a social security number, card number, email or IPv4 address.
//!    Detection only; nothing is redacted.
//!
//! 3. **Output validation** - Rejects generated text that still contains
//!    template placeholders such as `[REDACTED]`.
//!
//! ## Threat Model
//!
//! | Threat | Defense |
//! |--------|---------|
//! | Stored XSS via form fields | Script/handler/scheme stripping |
//! | Obfuscated tags (`<scr<script>ipt>`) | Fixed-point re-application |
//! | Invisible-character tag splitting | Zero-width/control char removal |
//! | Oversized payloads | Character truncation |
//! | PII sent to third-party model | Sensitive data detection |
//! | Unfilled template reaching the user | Placeholder blocklist |
//!
//! Pattern stripping is not an HTML sanitizer. Anything rendered as HTML
//! must still be escaped at the rendering layer.
//!
//! ## Usage
//!
//! ```rust
//! use careerguard_safety::SafetyGuard;
//!
//! let guard = SafetyGuard::new();
//!
//! let clean = guard.sanitize_input("<script>alert(1)</script>Rust developer");
//! assert_eq!(clean, "Rust developer");
//!
//! assert!(guard.contains_sensitive_info("SSN 123-45-6789"));
//! assert!(!guard.validate_output("Dear [REDACTED],"));
//! ```

pub mod guard;
pub mod models;
pub mod sanitize;

pub use guard::SafetyGuard;
pub use models::{SafetyConfig, SensitiveKind, DEFAULT_MAX_INPUT_CHARS, DEFAULT_PLACEHOLDER_MARKERS};
