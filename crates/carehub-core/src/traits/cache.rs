//! The key-value store behind rate limiting, the token blocklist and client
//! lookups.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// String key-value store with per-entry expiry.
///
/// Implemented by the moka and Redis backends in `carehub-cache`. Values
/// are opaque strings; the typed helpers store JSON.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// The value at `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store `value` at `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Read and decode a JSON value. A value that no longer decodes is a
    /// serialization error, not a miss.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> AppResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON and store it.
    async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>
    where
        Self: Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set(key, &json, ttl).await
    }

    /// Whether the backend answers. Used by `/api/health`.
    async fn health_check(&self) -> AppResult<bool>;
}
