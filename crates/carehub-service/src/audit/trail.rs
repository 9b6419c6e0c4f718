//! Best-effort audit side channel used by the domain services.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, warn};

use carehub_core::config::AuditConfig;
use carehub_core::result::AppResult;
use carehub_entity::audit::{AuditLog, EntityChange};

use super::logger::{AuditActionInput, ChangeLogger, EntityChangeInput};

/// Records changes and actions after the primary write has committed.
///
/// Transient write failures are retried with linear backoff. A record that
/// still cannot be written is logged at `error` and dropped; the caller
/// never sees the failure.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    logger: ChangeLogger,
    enabled: bool,
    max_attempts: u32,
    backoff: Duration,
}

impl AuditTrail {
    /// Creates a trail over a logger with the configured retry policy.
    pub fn new(logger: ChangeLogger, config: &AuditConfig) -> Self {
        Self {
            logger,
            enabled: config.enabled,
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Record one entity change. Returns the stored row, or `None` if the
    /// trail is disabled or the write was given up on.
    pub async fn record_change(&self, input: EntityChangeInput) -> Option<EntityChange> {
        if !self.enabled {
            return None;
        }

        let entity_type = input.entity_type.clone();
        let entity_id = input.entity_id.clone();

        // The id is fixed here so every retry targets the same row.
        let change = match self.logger.prepare(input) {
            Ok(change) => change,
            Err(e) => {
                error!(%entity_type, %entity_id, error = %e, "Discarding invalid entity change");
                return None;
            }
        };

        self.with_retry("entity change", &entity_type, &entity_id, || {
            self.logger.persist(&change)
        })
        .await
    }

    /// Record a change whose input may have failed to build. A build error
    /// is logged and nothing is written.
    pub async fn record_built(&self, input: AppResult<EntityChangeInput>) -> Option<EntityChange> {
        self.record_change(usable(input)?).await
    }

    /// Record many entity changes concurrently. Returns how many were stored.
    pub async fn record_changes(&self, inputs: Vec<EntityChangeInput>) -> usize {
        if !self.enabled || inputs.is_empty() {
            return 0;
        }

        let results = join_all(inputs.into_iter().map(|input| self.record_change(input))).await;
        results.iter().filter(|r| r.is_some()).count()
    }

    /// Record one audit action.
    pub async fn record_action(&self, input: AuditActionInput) -> Option<AuditLog> {
        if !self.enabled {
            return None;
        }

        let entity_type = input.entity_type.clone().unwrap_or_default();
        let entity_id = input.entity_id.clone().unwrap_or_default();

        self.with_retry("audit action", &entity_type, &entity_id, || {
            self.logger.log_audit_action(input.clone())
        })
        .await
    }

    async fn with_retry<T, F, Fut>(
        &self,
        what: &'static str,
        entity_type: &str,
        entity_id: &str,
        mut op: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Some(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        what,
                        entity_type,
                        entity_id,
                        attempt,
                        error = %e,
                        "Audit write failed, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        what,
                        entity_type,
                        entity_id,
                        attempts = attempt,
                        error = %e,
                        "Audit write failed, giving up"
                    );
                    return None;
                }
            }
        }
    }
}

/// Unwrap a built change input, logging and discarding a build error.
pub fn usable(input: AppResult<EntityChangeInput>) -> Option<EntityChangeInput> {
    match input {
        Ok(input) => Some(input),
        Err(e) => {
            error!(error = %e, "Could not build entity change, skipping audit record");
            None
        }
    }
}
