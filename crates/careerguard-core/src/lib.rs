//! # CareerGuard Core
//!
//! The guard layer every AI-bound request on the career platform passes
//! through. Bundles the Safety Guard, Token Guard, local cache and
//! temporary file storage behind one facade, plus the form validators and
//! the background sweep.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CareerGuard                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  validation ─▶ SafetyGuard ─▶ TokenGuard ─▶ TextGenerator    │
//! │                     ▲                            │           │
//! │                     └──────── review_output ◀────┘           │
//! │                                                              │
//! │  LocalCache (sled)      TemporaryFileStorage (tokio::fs)     │
//! │          ▲                          ▲                        │
//! │          └──────── Sweeper ─────────┘                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use careerguard_core::{CareerGuard, GuardConfig, ScanInput};
//!
//! let guard = CareerGuard::new(GuardConfig::load(path)?)?;
//! let sweeper = guard.spawn_sweeper();
//!
//! let report = guard.scan_job_posting("user-42", &form, &client).await?;
//!
//! sweeper.shutdown().await;
//! ```
//!
//! ## Notes
//!
//! - Limits are advisory and in-process; they reset when the process does.
//! - A refusal before the generator runs commits no usage.
//! - Sanitization is best-effort pattern stripping, not an HTML sanitizer.

mod config;
mod error;
mod guard;
mod sweeper;
mod validation;
mod verdict;

pub use config::{
    ttl_from_secs, CacheConfig, FileConfig, GuardConfig, PipelineConfig, SweepConfig,
};
pub use error::{GenerationError, GuardError};
pub use guard::{estimate_tokens, CareerGuard, ScanReport, TextGenerator};
pub use sweeper::{sweep_once, SweepReport, Sweeper};
pub use validation::{
    validate_negotiation_input, validate_scan_input, NegotiationInput, ScanInput, Validation,
    ValidationError,
};
pub use verdict::{BlockReason, ReviewFlag, Verdict};

// Re-export component types for convenience
pub use careerguard_clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use careerguard_limiter::{LimitError, LimiterConfig, TokenGuard, UsageRecord};
pub use careerguard_safety::{SafetyConfig, SafetyGuard, SensitiveKind};
pub use careerguard_store::{
    LocalCache, StoreError, StoredFile, TempFileRecord, TemporaryFileStorage,
};

/// Result type for CareerGuard operations.
pub type Result<T> = std::result::Result<T, GuardError>;
