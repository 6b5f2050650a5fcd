//! # Token Guard
//!
//! Advisory, in-process rate limiting for AI calls. Each user gets a window
//! (one hour by default) in which they may spend at most 10,000 tokens and
//! make at most 100 requests.
//!
//! ## Decision Rule
//!
//! 1. Look up the user's record, starting from a zeroed one if absent.
//! 2. If the window has lapsed, open a new window starting now that holds
//!    only this call (`n` tokens, one request) and admit.
//! 3. Otherwise compute prospective totals `tokens + n` and `requests + 1`.
//! 4. Deny if either exceeds its cap. Nothing is committed on denial, and
//!    a denied unknown user is not tracked.
//! 5. Otherwise commit both increments and admit.
//!
//! ## Memory Bound
//!
//! At most [`LimiterConfig::max_tracked_users`] records are held. Admitting a
//! check for an untracked user while at capacity evicts the least recently
//! checked user, whose usage is forgotten. The periodic sweep
//! ([`TokenGuard::reset_usage`]) additionally drops every lapsed record.
//!
//! ## Thread Safety
//!
//! State lives behind a mutex and every method takes `&self`, so one guard
//! can be shared through an `Arc` between request handlers and the sweep
//! task.
//!
//! ## Example
//!
//! ```rust
//! use careerguard_limiter::{LimiterConfig, TokenGuard};
//!
//! let guard = TokenGuard::new(LimiterConfig::new().with_max_requests(2));
//!
//! assert!(guard.check_limit("ada", 10));
//! assert!(guard.check_limit("ada", 10));
//! assert!(!guard.check_limit("ada", 10)); // third request in the hour
//!
//! assert_eq!(guard.get_user_usage("ada").requests, 2);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use careerguard_clock::{SharedClock, SystemClock};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LimitError, Result};
use crate::usage::UsageRecord;

/// Configuration for [`TokenGuard`].
///
/// # Example
///
/// ```rust
/// use careerguard_limiter::LimiterConfig;
///
/// let config = LimiterConfig::new()
///     .with_max_tokens(5_000)
///     .with_max_requests(50)
///     .with_window_secs(1_800);
/// assert_eq!(config.window().num_minutes(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Tokens allowed per user per window.
    pub max_tokens_per_window: u64,
    /// Requests allowed per user per window.
    pub max_requests_per_window: u32,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Records kept before least-recently-checked users are evicted.
    pub max_tracked_users: usize,
}

impl LimiterConfig {
    /// Creates a config with default values.
    ///
    /// Defaults:
    /// - Tokens: 10,000 per window
    /// - Requests: 100 per window
    /// - Window: 3,600 seconds
    /// - Tracked users: 10,000
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_tokens_per_window: 10_000,
            max_requests_per_window: 100,
            window_secs: 3_600,
            max_tracked_users: 10_000,
        }
    }

    /// Sets the token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, tokens: u64) -> Self {
        self.max_tokens_per_window = tokens;
        self
    }

    /// Sets the request cap.
    #[must_use]
    pub const fn with_max_requests(mut self, requests: u32) -> Self {
        self.max_requests_per_window = requests;
        self
    }

    /// Sets the window length.
    #[must_use]
    pub const fn with_window_secs(mut self, secs: u64) -> Self {
        self.window_secs = secs;
        self
    }

    /// Sets the tracked-user bound.
    #[must_use]
    pub const fn with_max_tracked_users(mut self, users: usize) -> Self {
        self.max_tracked_users = users;
        self
    }

    /// Window length as a duration.
    #[must_use]
    pub fn window(&self) -> Duration {
        i64::try_from(self.window_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Slot {
    record: UsageRecord,
    /// Tick of the last check, for LRU eviction.
    last_seen: u64,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    tick: u64,
    evicted: u64,
}

impl Inner {
    /// Drops the least recently checked user.
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_seen)
            .map(|(user, _)| user.clone())?;
        self.slots.remove(&victim);
        self.evicted += 1;
        Some(victim)
    }
}

/// Per-user hourly token and request limiter.
#[derive(Debug)]
pub struct TokenGuard {
    config: LimiterConfig,
    clock: SharedClock,
    inner: Mutex<Inner>,
}

impl TokenGuard {
    /// Creates a guard on the system clock.
    #[must_use]
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Creates a guard on the given clock.
    #[must_use]
    pub fn with_clock(config: LimiterConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits or denies a call spending `tokens` for `user_id`.
    ///
    /// Returns `true` and commits the usage if both caps hold, `false`
    /// otherwise. Use [`try_consume`](Self::try_consume) to learn which cap
    /// was hit.
    pub fn check_limit(&self, user_id: &str, tokens: u64) -> bool {
        match self.try_consume(user_id, tokens) {
            Ok(_) => true,
            Err(e) => {
                warn!("Usage denied for '{}': {}", user_id, e);
                false
            }
        }
    }

    /// Admits or denies a call, returning the committed record on success.
    ///
    /// A call that finds the user's window lapsed opens a new window holding
    /// just this call and is always admitted.
    ///
    /// # Errors
    ///
    /// - [`LimitError::TokenCapExceeded`] if the window's token total would
    ///   exceed the cap
    /// - [`LimitError::RequestCapExceeded`] if the request count would
    ///   exceed the cap
    pub fn try_consume(&self, user_id: &str, tokens: u64) -> Result<UsageRecord> {
        let now = self.clock.now();
        let window = self.config.window();
        let mut inner = self.lock();

        inner.tick += 1;
        let tick = inner.tick;

        let record = match inner.slots.get_mut(user_id) {
            Some(slot) => {
                slot.last_seen = tick;
                if slot.record.is_lapsed(now, window) {
                    debug!("Window lapsed for '{}', starting a new one", user_id);
                    UsageRecord {
                        tokens,
                        requests: 1,
                        window_start: now,
                    }
                } else {
                    self.admit(&slot.record, tokens)?
                }
            }
            None => self.admit(&UsageRecord::fresh(now), tokens)?,
        };

        // Only admitted calls may displace another user
        if !inner.slots.contains_key(user_id)
            && self.config.max_tracked_users > 0
            && inner.slots.len() >= self.config.max_tracked_users
        {
            if let Some(victim) = inner.evict_lru() {
                debug!("Evicted usage record for '{}'", victim);
            }
        }

        inner.slots.insert(
            user_id.to_string(),
            Slot {
                record: record.clone(),
                last_seen: tick,
            },
        );
        Ok(record)
    }

    /// Applies one call of `tokens` to `record` within its window.
    fn admit(&self, record: &UsageRecord, tokens: u64) -> Result<UsageRecord> {
        let prospective_tokens = record.tokens.saturating_add(tokens);
        if prospective_tokens > self.config.max_tokens_per_window {
            return Err(LimitError::TokenCapExceeded {
                requested: tokens,
                used: record.tokens,
                limit: self.config.max_tokens_per_window,
            });
        }

        let prospective_requests = record.requests.saturating_add(1);
        if prospective_requests > self.config.max_requests_per_window {
            return Err(LimitError::RequestCapExceeded {
                used: record.requests,
                limit: self.config.max_requests_per_window,
            });
        }

        Ok(UsageRecord {
            tokens: prospective_tokens,
            requests: prospective_requests,
            window_start: record.window_start,
        })
    }

    /// Sweeps every record and drops those whose window has lapsed.
    ///
    /// A dropped record reads back as zero, exactly as a reset one would.
    /// Returns the number of records dropped.
    pub fn reset_usage(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window();
        let mut inner = self.lock();

        let before = inner.slots.len();
        inner
            .slots
            .retain(|_, slot| !slot.record.is_lapsed(now, window));
        let dropped = before - inner.slots.len();

        if dropped > 0 {
            info!("Usage sweep dropped {} lapsed records", dropped);
        }
        dropped
    }

    /// Returns the user's usage in their current window.
    ///
    /// Untracked users and users whose window has lapsed read as a zero
    /// record opening now. Does not count as a check for LRU purposes.
    #[must_use]
    pub fn get_user_usage(&self, user_id: &str) -> UsageRecord {
        let now = self.clock.now();
        let window = self.config.window();
        let inner = self.lock();

        match inner.slots.get(user_id) {
            Some(slot) if !slot.record.is_lapsed(now, window) => slot.record.clone(),
            _ => UsageRecord::fresh(now),
        }
    }

    /// Number of users currently tracked.
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.lock().slots.len()
    }

    /// Total records evicted by the capacity bound.
    #[must_use]
    pub fn evicted_count(&self) -> u64 {
        self.lock().evicted
    }
}

impl Default for TokenGuard {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}
