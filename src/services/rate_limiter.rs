//! Rate limiting for the email-code sign-in flow
//!
//! Two independent windows, both keyed by lowercase email:
//! - code requests: 5 per 15 minutes
//! - failed code exchanges: 5 per 15 minutes

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const MAX_ATTEMPTS: usize = 5;
pub const WINDOW_MINUTES: i64 = 15;

#[derive(Default)]
struct AttemptLog {
    attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl AttemptLog {
    async fn is_limited(&self, key: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);

        let times = attempts.entry(key.to_lowercase()).or_default();
        times.retain(|time| *time > cutoff);
        times.len() >= MAX_ATTEMPTS
    }

    async fn record(&self, key: &str) {
        self.attempts
            .write()
            .await
            .entry(key.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    async fn clear(&self, key: &str) {
        self.attempts.write().await.remove(&key.to_lowercase());
    }

    async fn prune(&self, cutoff: DateTime<Utc>) {
        self.attempts.write().await.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }
}

#[derive(Clone, Default)]
pub struct AuthRateLimiter {
    code_requests: Arc<AttemptLog>,
    failed_exchanges: Arc<AttemptLog>,
}

impl AuthRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_code_request_limited(&self, email: &str) -> bool {
        self.code_requests.is_limited(email).await
    }

    pub async fn record_code_request(&self, email: &str) {
        self.code_requests.record(email).await;
    }

    pub async fn is_exchange_limited(&self, email: &str) -> bool {
        self.failed_exchanges.is_limited(email).await
    }

    pub async fn record_failed_exchange(&self, email: &str) {
        self.failed_exchanges.record(email).await;
    }

    /// Forget failed exchanges after a successful sign-in
    pub async fn clear_failed_exchanges(&self, email: &str) {
        self.failed_exchanges.clear(email).await;
    }

    /// Drop entries outside the window (called periodically)
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);
        self.code_requests.prune(cutoff).await;
        self.failed_exchanges.prune(cutoff).await;
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.code_requests.attempts.read().await.len()
            + self.failed_exchanges.attempts.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_code_requests_limited_after_five() {
        let limiter = AuthRateLimiter::new();

        for _ in 0..MAX_ATTEMPTS {
            assert!(!limiter.is_code_request_limited("anna@shelter.test").await);
            limiter.record_code_request("anna@shelter.test").await;
        }
        assert!(limiter.is_code_request_limited("anna@shelter.test").await);
        assert!(!limiter.is_code_request_limited("boris@shelter.test").await);
    }

    #[tokio::test]
    async fn test_windows_are_independent() {
        let limiter = AuthRateLimiter::new();
        for _ in 0..MAX_ATTEMPTS {
            limiter.record_failed_exchange("anna@shelter.test").await;
        }

        assert!(limiter.is_exchange_limited("anna@shelter.test").await);
        assert!(!limiter.is_code_request_limited("anna@shelter.test").await);

        limiter.clear_failed_exchanges("anna@shelter.test").await;
        assert!(!limiter.is_exchange_limited("anna@shelter.test").await);
    }

    #[tokio::test]
    async fn test_email_case_ignored() {
        let limiter = AuthRateLimiter::new();
        for email in ["Anna@Shelter.test", "anna@shelter.test", "ANNA@SHELTER.TEST"] {
            limiter.record_failed_exchange(email).await;
        }
        limiter.record_failed_exchange("anna@shelter.test").await;
        assert!(!limiter.is_exchange_limited("anna@shelter.test").await);

        limiter.record_failed_exchange("anna@shelter.test").await;
        assert!(limiter.is_exchange_limited("Anna@Shelter.Test").await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = AuthRateLimiter::new();
        limiter.record_code_request("anna@shelter.test").await;
        limiter.record_failed_exchange("boris@shelter.test").await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 2);
    }
}
