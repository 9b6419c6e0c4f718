//! Fixed-window request rate limiter backed by the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use carehub_cache::CacheManager;
use carehub_cache::keys;
use carehub_core::config::RateLimitConfig;
use carehub_core::result::AppResult;
use carehub_core::traits::CacheProvider;

/// Counter stored per key for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct WindowRecord {
    /// Requests admitted in this window.
    count: u32,
    /// When the window closes, in epoch milliseconds.
    reset_time: i64,
    /// A request has already been refused in this window.
    #[serde(default)]
    refused: bool,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request fits in the current window.
    Allowed,
    /// The window is exhausted. `first` is set for the first refusal of the
    /// window only, so callers can report a flood once.
    Refused { first: bool },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Admits at most `max_requests` per key in each fixed window.
///
/// The read-modify-write against the cache is not atomic, so a burst from
/// one key can be over-admitted slightly. When the cache cannot be reached
/// the limiter fails open.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Counter store.
    cache: Arc<CacheManager>,
    /// Window length.
    window: Duration,
    /// Requests allowed per window.
    max_requests: u32,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    pub fn new(cache: Arc<CacheManager>, config: &RateLimitConfig) -> Self {
        Self::with_limits(
            cache,
            config.max_requests,
            Duration::from_secs(config.window_seconds),
        )
    }

    /// Creates a limiter with explicit limits.
    pub fn with_limits(cache: Arc<CacheManager>, max_requests: u32, window: Duration) -> Self {
        Self {
            cache,
            window: window.max(Duration::from_millis(1)),
            max_requests: max_requests.max(1),
        }
    }

    /// Whether `key` may make another request now.
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.decide(key).await.is_allowed()
    }

    /// Whether `key` may make another request at `now_ms` (epoch millis).
    pub async fn is_allowed_at(&self, key: &str, now_ms: i64) -> bool {
        self.decide_at(key, now_ms).await.is_allowed()
    }

    /// Check and count a request from `key` now.
    pub async fn decide(&self, key: &str) -> RateDecision {
        self.decide_at(key, Utc::now().timestamp_millis()).await
    }

    /// Check and count a request from `key` at `now_ms` (epoch millis).
    pub async fn decide_at(&self, key: &str, now_ms: i64) -> RateDecision {
        match self.check(key, now_ms).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(key, error = %e, "Rate limit store unavailable, allowing request");
                RateDecision::Allowed
            }
        }
    }

    async fn check(&self, key: &str, now_ms: i64) -> AppResult<RateDecision> {
        let cache_key = keys::rate_limit(key);
        let window_ms = i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX);

        let (next, decision) = match self.cache.get_json::<WindowRecord>(&cache_key).await? {
            Some(record) if now_ms < record.reset_time => {
                if record.count >= self.max_requests {
                    if record.refused {
                        return Ok(RateDecision::Refused { first: false });
                    }
                    let marked = WindowRecord {
                        refused: true,
                        ..record
                    };
                    (marked, RateDecision::Refused { first: true })
                } else {
                    let counted = WindowRecord {
                        count: record.count + 1,
                        ..record
                    };
                    (counted, RateDecision::Allowed)
                }
            }
            _ => (
                WindowRecord {
                    count: 1,
                    reset_time: now_ms.saturating_add(window_ms),
                    refused: false,
                },
                RateDecision::Allowed,
            ),
        };

        // The record lives until its window closes.
        let remaining = u64::try_from(next.reset_time - now_ms).unwrap_or(0).max(1);
        self.cache
            .set_json(&cache_key, &next, Duration::from_millis(remaining))
            .await?;

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use carehub_cache::memory::MemoryCacheProvider;
    use carehub_core::AppError;
    use carehub_core::config::cache::MemoryCacheConfig;

    use super::*;

    const MINUTE_MS: i64 = 60_000;

    fn memory_cache() -> Arc<CacheManager> {
        let provider = MemoryCacheProvider::new(&MemoryCacheConfig::default());
        Arc::new(CacheManager::from_provider(Arc::new(provider)))
    }

    #[derive(Debug)]
    struct UnreachableCache;

    #[async_trait]
    impl CacheProvider for UnreachableCache {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::cache("connection refused"))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete(&self, _key: &str) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Err(AppError::cache("connection refused"))
        }
        async fn health_check(&self) -> AppResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_fixed_window_two_per_minute() {
        let limiter = RateLimiter::with_limits(memory_cache(), 2, Duration::from_secs(60));
        let start = 1_700_000_000_000;

        assert!(limiter.is_allowed_at("x", start).await);
        assert!(limiter.is_allowed_at("x", start + 1_000).await);
        assert!(!limiter.is_allowed_at("x", start + 2_000).await);
        assert!(limiter.is_allowed_at("x", start + MINUTE_MS).await);
    }

    #[tokio::test]
    async fn test_refusals_do_not_extend_the_window() {
        let limiter = RateLimiter::with_limits(memory_cache(), 1, Duration::from_secs(60));
        let start = 1_700_000_000_000;

        assert!(limiter.is_allowed_at("x", start).await);
        for offset in [10_000, 30_000, 59_999] {
            assert!(!limiter.is_allowed_at("x", start + offset).await);
        }
        assert!(limiter.is_allowed_at("x", start + MINUTE_MS).await);
    }

    #[tokio::test]
    async fn test_only_first_refusal_of_a_window_is_flagged() {
        let limiter = RateLimiter::with_limits(memory_cache(), 1, Duration::from_secs(60));
        let start = 1_700_000_000_000;

        assert_eq!(limiter.decide_at("x", start).await, RateDecision::Allowed);
        assert_eq!(
            limiter.decide_at("x", start + 1_000).await,
            RateDecision::Refused { first: true }
        );
        for offset in [2_000, 30_000, 59_999] {
            assert_eq!(
                limiter.decide_at("x", start + offset).await,
                RateDecision::Refused { first: false }
            );
        }

        // A new window starts a new flood.
        assert_eq!(limiter.decide_at("x", start + MINUTE_MS).await, RateDecision::Allowed);
        assert_eq!(
            limiter.decide_at("x", start + MINUTE_MS + 1).await,
            RateDecision::Refused { first: true }
        );
        assert_eq!(limiter.decide_at("y", start + 1).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn test_keys_are_counted_separately() {
        let limiter = RateLimiter::with_limits(memory_cache(), 1, Duration::from_secs(60));
        let now = 1_700_000_000_000;

        assert!(limiter.is_allowed_at("10.0.0.1", now).await);
        assert!(limiter.is_allowed_at("10.0.0.2", now).await);
        assert!(!limiter.is_allowed_at("10.0.0.1", now).await);
    }

    #[tokio::test]
    async fn test_fails_open_when_cache_is_down() {
        let cache = Arc::new(CacheManager::from_provider(Arc::new(UnreachableCache)));
        let limiter = RateLimiter::with_limits(cache, 1, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.is_allowed("x").await);
        }
    }

    #[test]
    fn test_limits_from_config() {
        let config = RateLimitConfig::default();
        let limiter = RateLimiter::new(memory_cache(), &config);
        assert_eq!(limiter.max_requests, 100);
        assert_eq!(limiter.window, Duration::from_secs(60));
    }
}
