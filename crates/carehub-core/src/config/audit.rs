//! Change-audit configuration.

use serde::{Deserialize, Serialize};

/// Retry policy for the audit side channel.
///
/// Audit writes happen after the primary mutation has committed; a write
/// that still fails after `max_attempts` is logged and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether change and action records are written.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Total attempts per record, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay added per failed attempt, in milliseconds.
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_backoff(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    200
}
