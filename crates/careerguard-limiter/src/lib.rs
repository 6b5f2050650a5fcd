//! # Token Guard
//!
//! Per-user hourly caps on AI usage: tokens spent and requests made.
//! Every AI-bound request checks the guard before the external call.
//!
//! ## Threat Model
//!
//! Unmetered AI endpoints invite two kinds of abuse:
//! - **Cost exhaustion** (token cap per window)
//! - **Request flooding** (request cap per window)
//!
//! A third risk comes from the guard itself: one record per distinct user
//! grows without bound. The guard caps tracked users and evicts the least
//! recently checked one.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`TokenGuard`] | Admit/deny decisions, sweep, snapshots |
//! | [`LimiterConfig`] | Caps, window length, user bound |
//! | [`UsageRecord`] | One user's counters for the current window |
//! | [`LimitError`] | Which cap a denied call hit |
//!
//! ## Security Notes
//!
//! - Advisory and in-process only: not durable, not shared across processes
//! - Checks happen BEFORE the guarded call; denied calls commit nothing
//! - Eviction forgets usage, so a very large user population can let an
//!   evicted user start over early

mod error;
mod guard;
mod usage;

pub use error::{LimitError, Result};
pub use guard::{LimiterConfig, TokenGuard};
pub use usage::UsageRecord;
