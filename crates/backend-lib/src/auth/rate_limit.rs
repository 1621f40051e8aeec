// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Lockout for repeated failed logins against one identity.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LoginRateLimitSettings;

/// How long an idle failure record is kept before cleanup drops it
const FAILURE_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of consecutive failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the lockout expires, if locked out
    lockout_expiry: Option<Instant>,
}

/// Failed-login limiter keyed by normalized identity (email)
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    /// Maximum number of failed attempts before lockout
    max_attempts: u32,
    /// Duration of lockout period
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::from_settings(&LoginRateLimitSettings::default())
    }
}

impl AuthRateLimiter {
    /// Create a new auth rate limiter
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    pub fn from_settings(settings: &LoginRateLimitSettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.lockout_secs),
        )
    }

    fn key(identity: &str) -> String {
        identity.trim().to_lowercase()
    }

    /// Record a failed authentication attempt
    pub fn record_failed_attempt(&self, identity: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(Self::key(identity))
            .or_insert_with(|| RateLimitEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // Start over once a previous lockout has run out
        if matches!(entry.lockout_expiry, Some(expiry) if now >= expiry) {
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts && entry.lockout_expiry.is_none() {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                attempts = entry.failed_attempts,
                lockout_secs = self.lockout_duration.as_secs(),
                "identity locked out after repeated failed logins"
            );
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, identity: &str) {
        self.attempts.remove(&Self::key(identity));
    }

    /// Check if an identity is allowed to attempt authentication
    pub fn check_rate_limit(&self, identity: &str) -> bool {
        match self.attempts.get(&Self::key(identity)) {
            Some(entry) => !matches!(entry.lockout_expiry, Some(expiry) if Instant::now() < expiry),
            None => true,
        }
    }

    /// Clean up expired lockouts and stale failure records
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.duration_since(entry.last_failure) < FAILURE_RETENTION,
        });
    }

    /// Number of identities currently tracked
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
