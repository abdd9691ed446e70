//! Rate limiter for login attempts
//!
//! Slows brute force attacks on the admin login:
//! - per email: 5 failed attempts per 15 minutes
//! - per IP: 10 login requests per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

const MAX_EMAIL_ATTEMPTS: usize = 5;
const EMAIL_WINDOW_MINUTES: i64 = 15;
const MAX_IP_ATTEMPTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

/// Login rate limiter
pub struct LoginRateLimiter {
    email_attempts: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    ip_attempts: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            email_attempts: RwLock::new(HashMap::new()),
            ip_attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Check if an email is rate limited
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let mut attempts = self.email_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(EMAIL_WINDOW_MINUTES);

        let entry = attempts.entry(email.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= MAX_EMAIL_ATTEMPTS
    }

    /// Record a failed login attempt for an email
    pub async fn record_failed_attempt(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear failed attempts for an email (on successful login)
    pub async fn clear_email_attempts(&self, email: &str) {
        let mut attempts = self.email_attempts.write().await;
        attempts.remove(&email.to_lowercase());
    }

    /// Check if an IP is rate limited
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let mut attempts = self.ip_attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);

        let entry = attempts.entry(ip).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= MAX_IP_ATTEMPTS
    }

    /// Record a login request from an IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut attempts = self.ip_attempts.write().await;
        attempts.entry(ip).or_default().push(Utc::now());
    }

    /// Drop entries whose windows have fully elapsed; called periodically
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - Duration::minutes(EMAIL_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);

        {
            let mut attempts = self.email_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > email_cutoff);
                !times.is_empty()
            });
        }
        {
            let mut attempts = self.ip_attempts.write().await;
            attempts.retain(|_, times| {
                times.retain(|time| *time > ip_cutoff);
                !times.is_empty()
            });
        }
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_rate_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(!limiter.is_email_limited("a@beyond2c.org").await);
            limiter.record_failed_attempt("a@beyond2c.org").await;
        }
        limiter.record_failed_attempt("a@beyond2c.org").await;
        assert!(limiter.is_email_limited("a@beyond2c.org").await);
    }

    #[tokio::test]
    async fn test_email_limit_is_case_insensitive() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failed_attempt("A@Beyond2C.org").await;
        }
        assert!(limiter.is_email_limited("a@beyond2c.org").await);
    }

    #[tokio::test]
    async fn test_clear_email_attempts() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..5 {
            limiter.record_failed_attempt("a@beyond2c.org").await;
        }
        assert!(limiter.is_email_limited("a@beyond2c.org").await);

        limiter.clear_email_attempts("a@beyond2c.org").await;
        assert!(!limiter.is_email_limited("a@beyond2c.org").await);
    }

    #[tokio::test]
    async fn test_ip_rate_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("10.0.0.1").unwrap();

        for _ in 0..10 {
            assert!(!limiter.is_ip_limited(ip).await);
            limiter.record_ip_request(ip).await;
        }
        assert!(limiter.is_ip_limited(ip).await);
    }

    #[tokio::test]
    async fn test_ips_limited_independently() {
        let limiter = LoginRateLimiter::new();
        let busy = IpAddr::from_str("10.0.0.1").unwrap();
        let quiet = IpAddr::from_str("10.0.0.2").unwrap();

        for _ in 0..10 {
            limiter.record_ip_request(busy).await;
        }
        assert!(limiter.is_ip_limited(busy).await);
        assert!(!limiter.is_ip_limited(quiet).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("a@beyond2c.org").await;
        limiter.cleanup().await;

        let attempts = limiter.email_attempts.read().await;
        assert_eq!(attempts.len(), 1);
    }
}
