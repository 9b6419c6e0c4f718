//! Persistence seam for the change logger.

use async_trait::async_trait;

use carehub_core::result::AppResult;
use carehub_database::repositories::AuditRepository;
use carehub_entity::audit::{AuditLog, EntityChange, NewAuditLog, NewEntityChange};

/// Append-only storage for entity changes and audit log rows.
#[async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist an entity change with its field changes in one transaction.
    ///
    /// Writing an id that already exists returns the stored row unchanged.
    async fn insert_entity_change(&self, change: &NewEntityChange) -> AppResult<EntityChange>;

    /// Persist one audit log row.
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> AppResult<AuditLog>;
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn insert_entity_change(&self, change: &NewEntityChange) -> AppResult<EntityChange> {
        AuditRepository::insert_entity_change(self, change).await
    }

    async fn insert_audit_log(&self, entry: &NewAuditLog) -> AppResult<AuditLog> {
        AuditRepository::insert_audit_log(self, entry).await
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-process store used by unit tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;
    use uuid::Uuid;

    use carehub_core::AppError;
    use carehub_core::error::ErrorKind;
    use carehub_entity::audit::FieldChange;

    use super::*;

    /// Keeps rows in vectors; can be told to fail the next N writes.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryAuditStore {
        pub(crate) changes: Mutex<Vec<EntityChange>>,
        pub(crate) logs: Mutex<Vec<AuditLog>>,
        pub(crate) failures_left: AtomicU32,
        pub(crate) attempts: AtomicU32,
        pub(crate) failure_kind: Option<ErrorKind>,
    }

    impl MemoryAuditStore {
        pub(crate) fn failing(times: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                ..Self::default()
            }
        }

        pub(crate) fn with_error(mut self, kind: ErrorKind) -> Self {
            self.failure_kind = Some(kind);
            self
        }

        fn maybe_fail(&self) -> AppResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                let kind = self.failure_kind.unwrap_or(ErrorKind::Database);
                Err(AppError::new(kind, "connection reset"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AuditStore for MemoryAuditStore {
        async fn insert_entity_change(&self, change: &NewEntityChange) -> AppResult<EntityChange> {
            self.maybe_fail()?;
            let mut changes = self.changes.lock().unwrap();
            if let Some(existing) = changes.iter().find(|c| c.id == change.id) {
                return Ok(existing.clone());
            }

            let row = EntityChange {
                id: change.id,
                entity_type: change.entity_type.clone(),
                entity_id: change.entity_id.clone(),
                change_type: change.change_type,
                old_data: change.old_data.clone(),
                new_data: change.new_data.clone(),
                changed_by: change.changed_by,
                change_reason: change.change_reason.clone(),
                metadata: change.metadata.clone(),
                created_at: Utc::now(),
                field_changes: change
                    .field_changes
                    .iter()
                    .enumerate()
                    .map(|(position, field)| FieldChange {
                        id: Uuid::now_v7(),
                        entity_change_id: change.id,
                        position: position as i32,
                        field_name: field.field_name.clone(),
                        old_value: field.old_value.clone(),
                        new_value: field.new_value.clone(),
                        change_type: field.change_type,
                    })
                    .collect(),
            };
            changes.push(row.clone());
            Ok(row)
        }

        async fn insert_audit_log(&self, entry: &NewAuditLog) -> AppResult<AuditLog> {
            self.maybe_fail()?;
            let row = AuditLog {
                id: Uuid::now_v7(),
                action: entry.action,
                entity_type: entry.entity_type.clone(),
                entity_id: entry.entity_id.clone(),
                data: entry.data.clone(),
                ip_address: entry.ip_address.clone(),
                user_agent: entry.user_agent.clone(),
                user_id: entry.user_id,
                created_at: Utc::now(),
            };
            self.logs.lock().unwrap().push(row.clone());
            Ok(row)
        }
    }
}
