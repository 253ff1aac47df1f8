//! Fixed-window rate limiting for credential endpoints.
//!
//! Each key gets a counter and a reset time. Requests past the limit are still
//! counted, so a client that keeps hammering stays rejected until the window
//! ends. Expired entries are treated as absent on the next access; admitting a
//! new key into a large store also sweeps expired entries out.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::clock::{Clock, SystemClock};

pub const DEFAULT_EVICTION_THRESHOLD: usize = 10_000;

/// Build a limiter key from a route scope and a client identifier
pub fn rate_limit_key(scope: &str, client: &str) -> String {
    format!("{}:{}", scope, client)
}

/// Outcome of a single admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl AdmitResult {
    /// Whole seconds until the window resets, rounded up. At least 1 when rejected.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        let secs = millis.div_ceil(1000);
        if self.allowed {
            secs
        } else {
            secs.max(1)
        }
    }

    /// `X-RateLimit-*` header values, plus `Retry-After` when rejected
    pub fn headers(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("x-ratelimit-limit", self.limit.to_string()),
            ("x-ratelimit-remaining", self.remaining.to_string()),
            ("x-ratelimit-reset", self.reset_at.timestamp().to_string()),
        ];
        if !self.allowed {
            headers.push(("retry-after", self.retry_after_secs(now).to_string()));
        }
        headers
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// In-memory fixed-window rate limiter. Clones share the same store.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    clock: Arc<dyn Clock>,
    eviction_threshold: usize,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
        }
    }

    pub fn eviction_threshold(mut self, threshold: usize) -> Self {
        self.eviction_threshold = threshold.max(1);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Count one request against `key` and decide whether it may proceed
    pub fn admit(&self, key: &str, limit: u32, window: Duration) -> AdmitResult {
        let now = self.clock.now();
        let reset_at = chrono::Duration::from_std(window)
            .ok()
            .and_then(|w| now.checked_add_signed(w))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.lock();

        if !entries.contains_key(key) && entries.len() >= self.eviction_threshold {
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            tracing::debug!(
                evicted = before - entries.len(),
                remaining = entries.len(),
                "Swept expired rate limit entries"
            );
        }

        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if e.is_expired(now) {
                    e.count = 1;
                    e.reset_at = reset_at;
                } else {
                    e.count = e.count.saturating_add(1);
                }
            })
            .or_insert(RateLimitEntry { count: 1, reset_at });

        let allowed = entry.count <= limit;
        if !allowed {
            tracing::warn!(key = %key, count = entry.count, limit, "Rate limit exceeded");
        }

        AdmitResult {
            allowed,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Current count for `key` within its live window
    pub fn count(&self, key: &str) -> Option<u32> {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.count)
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;

    const WINDOW: Duration = Duration::from_secs(15 * 60);

    fn limiter() -> (RateLimiter, ManualClock) {
        let clock = ManualClock::at_timestamp(1_700_000_000);
        (RateLimiter::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_rate_limit_allows_under_limit() {
        let (limiter, _) = limiter();
        let remaining: Vec<u32> = (0..5)
            .map(|_| {
                let r = limiter.admit("login:1.2.3.4", 5, WINDOW);
                assert!(r.allowed);
                r.remaining
            })
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rejected_attempts_still_count() {
        let (limiter, _) = limiter();
        for _ in 0..5 {
            limiter.admit("k", 5, WINDOW);
        }
        for _ in 0..3 {
            let r = limiter.admit("k", 5, WINDOW);
            assert!(!r.allowed);
            assert_eq!(r.remaining, 0);
        }
        assert_eq!(limiter.count("k"), Some(8));
    }

    #[test]
    fn test_window_resets_without_carryover() {
        let (limiter, clock) = limiter();
        for _ in 0..7 {
            limiter.admit("k", 5, WINDOW);
        }
        clock.advance(WINDOW);

        let r = limiter.admit("k", 5, WINDOW);
        assert!(r.allowed);
        assert_eq!(r.remaining, 4);
        assert_eq!(limiter.count("k"), Some(1));
    }

    #[test]
    fn test_window_is_fixed_not_sliding() {
        let (limiter, clock) = limiter();
        let first = limiter.admit("k", 5, WINDOW);
        clock.advance(Duration::from_secs(60));
        let second = limiter.admit("k", 5, WINDOW);
        assert_eq!(first.reset_at, second.reset_at);
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = limiter();
        for _ in 0..6 {
            limiter.admit("login:a", 5, WINDOW);
        }
        assert!(limiter.admit("login:b", 5, WINDOW).allowed);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            limiter.admit("k", 5, WINDOW);
        }
        clock.advance(Duration::from_millis(899_500));
        let r = limiter.admit("k", 5, WINDOW);
        assert!(!r.allowed);
        assert_eq!(r.retry_after_secs(clock.now()), 1);
    }

    #[test]
    fn test_headers_for_rejection() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            limiter.admit("k", 5, WINDOW);
        }
        let r = limiter.admit("k", 5, WINDOW);
        let headers = r.headers(clock.now());
        assert!(headers.contains(&("x-ratelimit-limit", "5".to_string())));
        assert!(headers.contains(&("x-ratelimit-remaining", "0".to_string())));
        assert!(headers.contains(&("retry-after", "900".to_string())));
    }

    #[test]
    fn test_evict_expired() {
        let (limiter, clock) = limiter();
        limiter.admit("a", 5, Duration::from_secs(10));
        limiter.admit("b", 5, Duration::from_secs(100));
        clock.advance(Duration::from_secs(10));

        assert_eq!(limiter.evict_expired(), 1);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.count("a"), None);
        assert_eq!(limiter.count("b"), Some(1));
    }

    #[test]
    fn test_threshold_triggers_sweep() {
        let clock = ManualClock::at_timestamp(1_700_000_000);
        let limiter = RateLimiter::with_clock(Arc::new(clock.clone())).eviction_threshold(3);
        for key in ["a", "b", "c"] {
            limiter.admit(key, 5, Duration::from_secs(10));
        }
        clock.advance(Duration::from_secs(11));

        limiter.admit("d", 5, Duration::from_secs(10));
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_concurrent_admissions_lose_no_updates() {
        let (limiter, _) = limiter();
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || limiter.admit("k", 64, WINDOW))
            })
            .collect();

        let results: Vec<AdmitResult> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|r| r.allowed));
        assert_eq!(limiter.count("k"), Some(64));

        let mut remaining: Vec<u32> = results.iter().map(|r| r.remaining).collect();
        remaining.sort_unstable();
        assert_eq!(remaining, (0..64).collect::<Vec<u32>>());
    }
}
