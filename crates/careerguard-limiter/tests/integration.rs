//! # Integration Tests
//!
//! End-to-end behaviour of TokenGuard under a driven clock.

use std::sync::Arc;
use std::thread;

use careerguard_clock::ManualClock;
use careerguard_limiter::{LimitError, LimiterConfig, TokenGuard};
use chrono::Duration;

fn guard(config: LimiterConfig) -> (TokenGuard, ManualClock) {
    let clock = ManualClock::epoch();
    (TokenGuard::with_clock(config, clock.shared()), clock)
}

// ============================================================================
// Cap Enforcement
// ============================================================================

#[test]
fn test_request_cap_hits_on_101st_call() {
    let (guard, _clock) = guard(LimiterConfig::default());

    let admitted = (0..101).filter(|_| guard.check_limit("user-1", 0)).count();

    assert_eq!(admitted, 100);
    assert!(matches!(
        guard.try_consume("user-1", 0),
        Err(LimitError::RequestCapExceeded { used: 100, limit: 100 })
    ));
}

#[test]
fn test_token_cap_denies_the_crossing_call_only() {
    let (guard, _clock) = guard(LimiterConfig::default());

    // 9 calls of 1,100 tokens = 9,900; the 10th would make 11,000
    for _ in 0..9 {
        assert!(guard.check_limit("user-1", 1_100));
    }
    assert!(!guard.check_limit("user-1", 1_100));

    // A smaller call that still fits is admitted
    assert!(guard.check_limit("user-1", 100));
    assert_eq!(guard.get_user_usage("user-1").tokens, 10_000);
}

#[test]
fn test_single_oversized_call_denied() {
    let (guard, _clock) = guard(LimiterConfig::default());
    assert!(!guard.check_limit("user-1", 10_001));
    assert!(guard.get_user_usage("user-1").is_zero());
}

// ============================================================================
// Window Lifecycle
// ============================================================================

#[test]
fn test_window_elapse_restores_service() {
    let (guard, clock) = guard(LimiterConfig::default());
    assert!(guard.check_limit("user-1", 10_000));
    assert!(!guard.check_limit("user-1", 1));

    clock.advance(Duration::hours(1) + Duration::seconds(1));

    assert!(guard.check_limit("user-1", 1));
    let usage = guard.get_user_usage("user-1");
    assert_eq!(usage.tokens, 1);
    assert_eq!(usage.requests, 1);
}

#[test]
fn test_hourly_sweep_then_fresh_window() {
    let (guard, clock) = guard(LimiterConfig::default());
    for user in ["a", "b", "c"] {
        guard.check_limit(user, 100);
    }
    assert_eq!(guard.tracked_users(), 3);

    clock.advance(Duration::minutes(90));
    assert_eq!(guard.reset_usage(), 3);
    assert_eq!(guard.tracked_users(), 0);

    assert!(guard.check_limit("a", 100));
    assert_eq!(guard.get_user_usage("a").requests, 1);
}

#[test]
fn test_custom_window_length() {
    let config = LimiterConfig::new().with_window_secs(60).with_max_requests(1);
    let (guard, clock) = guard(config);

    assert!(guard.check_limit("u", 0));
    assert!(!guard.check_limit("u", 0));
    clock.advance(Duration::seconds(61));
    assert!(guard.check_limit("u", 0));
}

// ============================================================================
// Memory Bound
// ============================================================================

#[test]
fn test_tracked_users_never_exceed_bound() {
    let (guard, _clock) = guard(LimiterConfig::new().with_max_tracked_users(50));

    for i in 0..500 {
        guard.check_limit(&format!("user-{}", i), 1);
    }

    assert_eq!(guard.tracked_users(), 50);
    assert_eq!(guard.evicted_count(), 450);
    // The most recent users survive
    assert_eq!(guard.get_user_usage("user-499").requests, 1);
    assert!(guard.get_user_usage("user-0").is_zero());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_shared_guard_never_over_admits() {
    let (guard, _clock) = guard(LimiterConfig::default());
    let guard = Arc::new(guard);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = Arc::clone(&guard);
            thread::spawn(move || (0..50).filter(|_| guard.check_limit("shared", 10)).count())
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(admitted, 100);
    let usage = guard.get_user_usage("shared");
    assert_eq!(usage.requests, 100);
    assert_eq!(usage.tokens, 1_000);
}
