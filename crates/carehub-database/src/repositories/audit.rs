//! Audit ledger repository implementation.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use carehub_core::error::{AppError, ErrorKind};
use carehub_core::result::AppResult;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_entity::audit::{
    AuditLog, AuditLogFilter, EntityChange, FieldChange, NewAuditLog, NewEntityChange,
};

use super::db_error;

/// Repository for entity changes, their field changes, and audit log rows.
///
/// Both tables are append-only; nothing here updates or deletes.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    /// Create a new audit repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist an entity change and all of its field changes atomically.
    ///
    /// Inserting an id that already exists is a no-op that returns the stored
    /// row, so a retried write never duplicates the ledger.
    pub async fn insert_entity_change(&self, change: &NewEntityChange) -> AppResult<EntityChange> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin audit transaction", e))?;

        let inserted = sqlx::query_as::<_, EntityChange>(
            "INSERT INTO entity_changes \
             (id, entity_type, entity_id, change_type, old_data, new_data, changed_by, change_reason, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO NOTHING RETURNING *",
        )
        .bind(change.id)
        .bind(&change.entity_type)
        .bind(&change.entity_id)
        .bind(change.change_type)
        .bind(&change.old_data)
        .bind(&change.new_data)
        .bind(change.changed_by)
        .bind(&change.change_reason)
        .bind(&change.metadata)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to insert entity change", e))?;

        let Some(mut row) = inserted else {
            drop(tx);
            debug!(change_id = %change.id, "Entity change already recorded");
            return self.find_change(change.id).await?.ok_or_else(|| {
                AppError::new(
                    ErrorKind::Database,
                    format!("Entity change {} vanished after conflict", change.id),
                )
            });
        };

        if !change.field_changes.is_empty() {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO field_changes \
                 (id, entity_change_id, position, field_name, old_value, new_value, change_type) ",
            );
            qb.push_values(
                change.field_changes.iter().enumerate(),
                |mut b, (position, field)| {
                    b.push_bind(Uuid::now_v7())
                        .push_bind(change.id)
                        .push_bind(position as i32)
                        .push_bind(field.field_name.clone())
                        .push_bind(field.old_value.clone())
                        .push_bind(field.new_value.clone())
                        .push_bind(field.change_type);
                },
            );
            qb.push(" RETURNING *");

            let mut fields = qb
                .build_query_as::<FieldChange>()
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to insert field changes", e))?;
            fields.sort_by_key(|f| f.position);
            row.field_changes = fields;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit audit transaction", e))?;

        Ok(row)
    }

    /// Find an entity change with its field changes.
    pub async fn find_change(&self, id: Uuid) -> AppResult<Option<EntityChange>> {
        let change =
            sqlx::query_as::<_, EntityChange>("SELECT * FROM entity_changes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find entity change", e))?;

        match change {
            Some(mut change) => {
                let mut fields = self.load_field_changes(&[change.id]).await?;
                change.field_changes = fields.remove(&change.id).unwrap_or_default();
                Ok(Some(change))
            }
            None => Ok(None),
        }
    }

    /// List the changes of one entity, newest first, each with its fields.
    pub async fn entity_history(
        &self,
        entity_type: &str,
        entity_id: &str,
        page: &PageRequest,
    ) -> AppResult<PageResponse<EntityChange>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entity_changes WHERE entity_type = $1 AND entity_id = $2",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to count entity changes", e))?;

        let mut changes = sqlx::query_as::<_, EntityChange>(
            "SELECT * FROM entity_changes WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
        )
        .bind(entity_type)
        .bind(entity_id)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list entity changes", e))?;

        let ids: Vec<Uuid> = changes.iter().map(|c| c.id).collect();
        let mut fields = self.load_field_changes(&ids).await?;
        for change in &mut changes {
            change.field_changes = fields.remove(&change.id).unwrap_or_default();
        }

        Ok(PageResponse::new(changes, page, total as u64))
    }

    /// Persist one audit log row.
    pub async fn insert_audit_log(&self, entry: &NewAuditLog) -> AppResult<AuditLog> {
        sqlx::query_as::<_, AuditLog>(
            "INSERT INTO audit_logs \
             (id, action, entity_type, entity_id, data, ip_address, user_agent, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.data)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(entry.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert audit log", e))
    }

    /// Search audit log rows, newest first. All filters must match.
    pub async fn search_logs(
        &self,
        filters: &[AuditLogFilter],
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLog>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_logs");
        push_log_filters(&mut count, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count audit logs", e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs");
        push_log_filters(&mut select, filters);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let logs = select
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to search audit logs", e))?;

        Ok(PageResponse::new(logs, page, total as u64))
    }

    async fn load_field_changes(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<FieldChange>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, FieldChange>(
            "SELECT * FROM field_changes WHERE entity_change_id = ANY($1) \
             ORDER BY entity_change_id, position",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load field changes", e))?;

        let mut grouped: HashMap<Uuid, Vec<FieldChange>> = HashMap::new();
        for row in rows {
            grouped.entry(row.entity_change_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

fn push_log_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[AuditLogFilter]) {
    let mut first = true;
    for filter in filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
        match filter {
            AuditLogFilter::Action(action) => {
                qb.push("action = ").push_bind(*action);
            }
            AuditLogFilter::User(user_id) => {
                qb.push("user_id = ").push_bind(*user_id);
            }
            AuditLogFilter::EntityType(entity_type) => {
                qb.push("entity_type = ").push_bind(entity_type.clone());
            }
            AuditLogFilter::EntityId(entity_id) => {
                qb.push("entity_id = ").push_bind(entity_id.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carehub_entity::audit::AuditAction;

    #[test]
    fn test_log_filters_render_in_order() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM audit_logs");
        push_log_filters(
            &mut qb,
            &[
                AuditLogFilter::Action(AuditAction::BulkCreate),
                AuditLogFilter::EntityType("Staff".into()),
            ],
        );
        assert_eq!(
            qb.sql(),
            "SELECT * FROM audit_logs WHERE action = $1 AND entity_type = $2"
        );
    }

    #[test]
    fn test_no_filters_leaves_query_untouched() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_logs");
        push_log_filters(&mut qb, &[]);
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM audit_logs");
    }
}
