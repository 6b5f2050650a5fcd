//! # Usage Records
//!
//! One [`UsageRecord`] per user: how many tokens and requests they have
//! spent since their current window opened.
//!
//! ## Window Semantics
//!
//! A window opens on the user's first check and lasts [`LimiterConfig::window`].
//! Once *more* than one window length has elapsed since `window_start`, the
//! record is stale and both counters are treated as zero.
//!
//! [`LimiterConfig::window`]: crate::LimiterConfig::window

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token and request counters for one user's current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Tokens consumed in this window.
    pub tokens: u64,
    /// Requests admitted in this window.
    pub requests: u32,
    /// When this window opened.
    pub window_start: DateTime<Utc>,
}

impl UsageRecord {
    /// Creates a zeroed record whose window opens at `now`.
    #[must_use]
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            tokens: 0,
            requests: 0,
            window_start: now,
        }
    }

    /// Returns true once more than `window` has elapsed since the window opened.
    #[inline]
    #[must_use]
    pub fn is_lapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.window_start > window
    }

    /// Returns true if nothing has been consumed in this window.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.tokens == 0 && self.requests == 0
    }

    /// Tokens still available under `limit`.
    #[inline]
    #[must_use]
    pub fn remaining_tokens(&self, limit: u64) -> u64 {
        limit.saturating_sub(self.tokens)
    }
}
