//! # CareerGuard Clock
//!
//! Every TTL and rate window in CareerGuard is measured against a [`Clock`]
//! handed in at construction time. Production code uses [`SystemClock`];
//! tests drive time explicitly with [`ManualClock`].
//!
//! ## Example
//!
//! ```rust
//! use careerguard_clock::{Clock, ManualClock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::epoch();
//! let before = clock.now();
//! clock.advance(Duration::minutes(61));
//! assert_eq!(clock.now() - before, Duration::minutes(61));
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Source of the current UTC time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Shared clock handle as stored by the guard components.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Returns the system clock as a shared handle.
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Cloning a `ManualClock` yields a handle onto the same instant, so a test
/// can keep one handle and give the other to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Creates a clock frozen at a fixed, arbitrary instant (2024-01-01T00:00:00Z).
    #[must_use]
    pub fn epoch() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }

    /// Moves the clock forward (or backward, for a negative delta).
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    /// Jumps the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Returns this clock as a shared handle.
    #[must_use]
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen() {
        let clock = ManualClock::epoch();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::epoch();
        let handle = clock.shared();
        let start = handle.now();

        clock.advance(Duration::hours(2));
        assert_eq!(handle.now() - start, Duration::hours(2));
    }

    #[test]
    fn test_set_jumps() {
        let clock = ManualClock::epoch();
        let target = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
