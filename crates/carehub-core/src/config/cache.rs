//! `[cache]` section: backend selection and client lookup TTL.

use serde::{Deserialize, Serialize};

/// Which backend holds rate-limit windows, the JWT blocklist and cached
/// clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `"memory"` (single process) or `"redis"` (shared across replicas).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// How long a client read stays cached, in seconds.
    #[serde(default = "default_client_ttl")]
    pub client_ttl_seconds: u64,
    #[serde(default)]
    pub redis: RedisCacheConfig,
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            client_ttl_seconds: default_client_ttl(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// `[cache.redis]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Connection URL; a password in it is masked in logs.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Namespace prepended to every key, for sharing one Redis between
    /// deployments.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: String::new(),
        }
    }
}

/// `[cache.memory]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Entry count at which moka starts evicting.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_client_ttl() -> u64 {
    300
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_capacity() -> u64 {
    10_000
}
