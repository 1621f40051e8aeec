// =========================
// tests/unit/rate_limit_tests.rs
// =========================
//! Failed-login lockout
use std::time::Duration;

use backend_lib::auth::AuthRateLimiter;
use backend_lib::config::LoginRateLimitSettings;

#[test]
fn test_lockout_is_per_identity() {
    let limiter = AuthRateLimiter::new(2, Duration::from_secs(60));
    limiter.record_failed_attempt("vera@example.com");
    limiter.record_failed_attempt("vera@example.com");

    assert!(!limiter.check_rate_limit("vera@example.com"));
    assert!(limiter.check_rate_limit("carl@example.com"));
}

#[test]
fn test_identity_is_normalized() {
    let limiter = AuthRateLimiter::new(2, Duration::from_secs(60));
    limiter.record_failed_attempt("Vera@Example.com");
    limiter.record_failed_attempt(" vera@example.com ");
    assert!(!limiter.check_rate_limit("VERA@EXAMPLE.COM"));
}

#[test]
fn test_success_clears_failures() {
    let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));
    limiter.record_failed_attempt("vera@example.com");
    limiter.record_failed_attempt("vera@example.com");
    limiter.record_success("vera@example.com");
    limiter.record_failed_attempt("vera@example.com");

    assert!(limiter.check_rate_limit("vera@example.com"));
    assert_eq!(limiter.tracked(), 1);
}

#[test]
fn test_lockout_expires() {
    let limiter = AuthRateLimiter::new(1, Duration::from_millis(20));
    limiter.record_failed_attempt("vera@example.com");
    assert!(!limiter.check_rate_limit("vera@example.com"));

    std::thread::sleep(Duration::from_millis(40));
    assert!(limiter.check_rate_limit("vera@example.com"));

    limiter.cleanup();
    assert_eq!(limiter.tracked(), 0);
}

#[test]
fn test_from_settings() {
    let limiter = AuthRateLimiter::from_settings(&LoginRateLimitSettings {
        max_attempts: 1,
        lockout_secs: 300,
    });
    limiter.record_failed_attempt("vera@example.com");
    assert!(!limiter.check_rate_limit("vera@example.com"));
}
