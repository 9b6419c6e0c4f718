//! Staff CRUD and transactional bulk operations.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use carehub_core::error::AppError;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_entity::audit::{AuditAction, ChangeMetadata, ChangeSource};
use carehub_entity::staff::{
    NewStaff, STAFF_ENTITY, Staff, StaffFilter, StaffPatch, StaffSortField, StaffUpdate,
};

use super::store::StaffStore;
use crate::audit::{AuditActionInput, AuditTrail, EntityChangeInput, usable};
use crate::client::ClientStore;
use crate::context::RequestContext;

/// Manages client staff.
#[derive(Debug, Clone)]
pub struct StaffService {
    /// Staff rows.
    staff_repo: Arc<dyn StaffStore>,
    /// Client rows, for ownership checks.
    client_repo: Arc<dyn ClientStore>,
    /// Audit side channel.
    trail: AuditTrail,
    /// Largest accepted bulk batch.
    max_bulk_size: usize,
}

impl StaffService {
    /// Creates a new staff service.
    pub fn new(
        staff_repo: Arc<dyn StaffStore>,
        client_repo: Arc<dyn ClientStore>,
        trail: AuditTrail,
        max_bulk_size: usize,
    ) -> Self {
        Self {
            staff_repo,
            client_repo,
            trail,
            max_bulk_size,
        }
    }

    /// Lists staff.
    pub async fn list(
        &self,
        filters: &[StaffFilter],
        sort: StaffSortField,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<PageResponse<Staff>, AppError> {
        self.staff_repo.list(filters, sort, direction, &page).await
    }

    /// Gets one staff member.
    pub async fn get(&self, id: Uuid) -> Result<Staff, AppError> {
        self.staff_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Creates one staff member.
    pub async fn create(&self, ctx: &RequestContext, data: NewStaff) -> Result<Staff, AppError> {
        self.ensure_client_exists(data.client_id).await?;

        let staff = self.staff_repo.create(&data).await?;
        info!(staff_id = %staff.id, client_id = %staff.client_id, user_id = %ctx.user_id, "Staff created");

        let input = EntityChangeInput::created(STAFF_ENTITY, staff.id, &staff).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(staff)
    }

    /// Applies a partial update to one staff member.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: StaffPatch,
    ) -> Result<Staff, AppError> {
        if patch.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let (before, after) = self
            .staff_repo
            .update(id, &patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(staff_id = %id, user_id = %ctx.user_id, "Staff updated");

        let input = EntityChangeInput::updated(STAFF_ENTITY, id, &before, &patch).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(after)
    }

    /// Deletes one staff member.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<Staff, AppError> {
        let removed = self
            .staff_repo
            .delete(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!(staff_id = %id, user_id = %ctx.user_id, "Staff deleted");

        let input = EntityChangeInput::deleted(STAFF_ENTITY, id, &removed).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(removed)
    }

    /// Creates every item or none of them.
    pub async fn bulk_create(
        &self,
        ctx: &RequestContext,
        items: Vec<NewStaff>,
    ) -> Result<Vec<Staff>, AppError> {
        self.check_batch_size(items.len())?;

        let mut client_ids: Vec<Uuid> = items.iter().map(|i| i.client_id).collect();
        client_ids.sort_unstable();
        client_ids.dedup();
        for client_id in client_ids {
            self.ensure_client_exists(client_id).await?;
        }

        let created = self.staff_repo.bulk_create(&items).await?;
        let batch_id = Uuid::now_v7();
        info!(count = created.len(), %batch_id, user_id = %ctx.user_id, "Bulk staff create committed");

        let inputs = created
            .iter()
            .filter_map(|staff| usable(EntityChangeInput::created(STAFF_ENTITY, staff.id, staff)))
            .collect();
        self.record_batch(ctx, AuditAction::BulkCreate, batch_id, inputs, &created)
            .await;

        Ok(created)
    }

    /// Updates every item or none of them. A missing id fails the batch.
    pub async fn bulk_update(
        &self,
        ctx: &RequestContext,
        items: Vec<StaffUpdate>,
    ) -> Result<Vec<Staff>, AppError> {
        self.check_batch_size(items.len())?;
        if let Some(item) = items.iter().find(|i| i.patch.is_empty()) {
            return Err(AppError::validation(format!(
                "No fields to update for staff member {}",
                item.id
            )));
        }

        let pairs = self.staff_repo.bulk_update(&items).await?;
        let batch_id = Uuid::now_v7();
        info!(count = pairs.len(), %batch_id, user_id = %ctx.user_id, "Bulk staff update committed");

        let inputs = pairs
            .iter()
            .zip(&items)
            .filter_map(|((before, _), item)| {
                usable(EntityChangeInput::updated(STAFF_ENTITY, before.id, before, &item.patch))
            })
            .collect();
        let updated: Vec<Staff> = pairs.into_iter().map(|(_, after)| after).collect();
        self.record_batch(ctx, AuditAction::BulkUpdate, batch_id, inputs, &updated)
            .await;

        Ok(updated)
    }

    /// Deletes every id or none of them. A missing id fails the batch.
    pub async fn bulk_delete(
        &self,
        ctx: &RequestContext,
        ids: Vec<Uuid>,
    ) -> Result<Vec<Staff>, AppError> {
        self.check_batch_size(ids.len())?;

        let deleted = self.staff_repo.bulk_delete(&ids).await?;
        let batch_id = Uuid::now_v7();
        info!(count = deleted.len(), %batch_id, user_id = %ctx.user_id, "Bulk staff delete committed");

        let inputs = deleted
            .iter()
            .filter_map(|staff| usable(EntityChangeInput::deleted(STAFF_ENTITY, staff.id, staff)))
            .collect();
        self.record_batch(ctx, AuditAction::BulkDelete, batch_id, inputs, &deleted)
            .await;

        Ok(deleted)
    }

    /// Fan out one change per row, then one summary action for the batch.
    async fn record_batch(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        batch_id: Uuid,
        inputs: Vec<EntityChangeInput>,
        rows: &[Staff],
    ) {
        let metadata = bulk_metadata(ctx, batch_id);
        let inputs = inputs
            .into_iter()
            .map(|input| input.by(ctx.user_id).with_metadata(metadata.clone()))
            .collect();
        let recorded = self.trail.record_changes(inputs).await;

        let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
        let summary = AuditActionInput::new(action)
            .entity_type(STAFF_ENTITY)
            .data(json!({
                "batchId": batch_id,
                "count": rows.len(),
                "recordedChanges": recorded,
                "ids": ids,
            }))
            .client(ctx.ip_address.clone(), ctx.user_agent.clone())
            .by(ctx.user_id);
        self.trail.record_action(summary).await;
    }

    fn check_batch_size(&self, len: usize) -> Result<(), AppError> {
        check_batch_size(len, self.max_bulk_size)
    }

    async fn ensure_client_exists(&self, client_id: Uuid) -> Result<(), AppError> {
        match self.client_repo.find_by_id(client_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::validation(format!(
                "Client {client_id} does not exist"
            ))),
        }
    }
}

fn check_batch_size(len: usize, max: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::validation("Bulk operation requires at least one item"));
    }
    if len > max {
        return Err(AppError::validation(format!(
            "Bulk operation accepts at most {max} items, got {len}"
        )));
    }
    Ok(())
}

fn bulk_metadata(ctx: &RequestContext, batch_id: Uuid) -> ChangeMetadata {
    ChangeMetadata {
        batch_id: Some(batch_id),
        ..ctx.metadata(ChangeSource::Bulk)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Staff member {id} not found"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::Value;

    use carehub_core::config::AuditConfig;
    use carehub_core::error::ErrorKind;
    use carehub_core::types::{AuthSession, Role};
    use carehub_entity::audit::ChangeType;
    use carehub_entity::client::NewClient;

    use super::*;
    use crate::audit::ChangeLogger;
    use crate::audit::store::memory::MemoryAuditStore;
    use crate::client::store::memory::MemoryClientStore;
    use crate::staff::store::memory::MemoryStaffStore;

    fn ctx() -> RequestContext {
        let session = AuthSession {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            email: "manager@example.com".into(),
            name: None,
            role: Role::Manager,
        };
        RequestContext::new(&session, "203.0.113.5".into(), None)
    }

    struct Fixture {
        service: StaffService,
        staff: Arc<MemoryStaffStore>,
        audit: Arc<MemoryAuditStore>,
        client_id: Uuid,
    }

    async fn fixture(audit: MemoryAuditStore) -> Fixture {
        let clients = Arc::new(MemoryClientStore::default());
        let client = clients
            .create(&NewClient {
                name: "Acme Care".into(),
                industry: None,
                contact_email: None,
                contact_phone: None,
                is_active: true,
            })
            .await
            .unwrap();
        let staff = Arc::new(MemoryStaffStore::default());
        let audit = Arc::new(audit);
        let trail = AuditTrail::new(
            ChangeLogger::new(audit.clone()),
            &AuditConfig {
                enabled: true,
                max_attempts: 1,
                retry_backoff_ms: 1,
            },
        );

        Fixture {
            service: StaffService::new(staff.clone(), clients, trail, 10),
            staff,
            audit,
            client_id: client.id,
        }
    }

    fn new_staff(client_id: Uuid, n: usize) -> NewStaff {
        NewStaff {
            client_id,
            first_name: format!("Worker{n}"),
            last_name: "Smith".into(),
            email: format!("worker{n}@example.com"),
            job_title: None,
            department: Some("Ops".into()),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_bulk_create_records_each_row_and_one_summary() {
        let f = fixture(MemoryAuditStore::default()).await;
        let items = (0..3).map(|n| new_staff(f.client_id, n)).collect();

        let created = f.service.bulk_create(&ctx(), items).await.unwrap();
        assert_eq!(created.len(), 3);

        let logs = f.audit.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::BulkCreate);
        assert_eq!(logs[0].entity_type.as_deref(), Some(STAFF_ENTITY));
        let data = logs[0].data.clone().unwrap();
        assert_eq!(data["count"], 3);
        assert_eq!(data["recordedChanges"], 3);
        assert_eq!(data["ids"].as_array().map(Vec::len), Some(3));

        let changes = f.audit.changes.lock().unwrap();
        assert_eq!(changes.len(), 3);
        for change in changes.iter() {
            assert_eq!(change.change_type, ChangeType::Create);
            let metadata = change.metadata.clone().unwrap();
            assert_eq!(metadata["batch_id"], data["batchId"]);
            assert_eq!(metadata["source"], Value::from("bulk"));
        }
    }

    #[tokio::test]
    async fn test_summary_counts_only_changes_that_were_stored() {
        let f = fixture(MemoryAuditStore::default()).await;
        let items = (0..4).map(|n| new_staff(f.client_id, n)).collect();
        let created = f.service.bulk_create(&ctx(), items).await.unwrap();
        let ids: Vec<Uuid> = created.iter().map(|s| s.id).collect();
        f.audit.changes.lock().unwrap().clear();
        f.audit.logs.lock().unwrap().clear();
        // The next audit write fails and is not retried.
        f.audit.failures_left.store(1, Ordering::SeqCst);

        let deleted = f.service.bulk_delete(&ctx(), ids).await.unwrap();

        assert_eq!(deleted.len(), 4);
        assert!(f.staff.staff.lock().unwrap().is_empty());
        assert_eq!(f.audit.changes.lock().unwrap().len(), 3);
        let logs = f.audit.logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, AuditAction::BulkDelete);
        let data = logs[0].data.clone().unwrap();
        assert_eq!(data["count"], 4);
        assert_eq!(data["recordedChanges"], 3);
    }

    #[tokio::test]
    async fn test_bulk_update_with_unknown_id_changes_nothing() {
        let f = fixture(MemoryAuditStore::default()).await;
        let staff = f.service.create(&ctx(), new_staff(f.client_id, 1)).await.unwrap();
        let patch = StaffPatch {
            department: Some(None),
            ..StaffPatch::default()
        };
        let items = vec![
            StaffUpdate {
                id: staff.id,
                patch: patch.clone(),
            },
            StaffUpdate {
                id: Uuid::new_v4(),
                patch,
            },
        ];

        let err = f.service.bulk_update(&ctx(), items).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(f.service.get(staff.id).await.unwrap().department.as_deref(), Some("Ops"));
        assert_eq!(f.audit.changes.lock().unwrap().len(), 1);
        assert!(f.audit.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_staff_for_unknown_client_is_rejected() {
        let f = fixture(MemoryAuditStore::default()).await;

        let err = f
            .service
            .create(&ctx(), new_staff(Uuid::new_v4(), 1))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(f.staff.staff.lock().unwrap().is_empty());
        assert!(f.audit.changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(check_batch_size(1, 500).is_ok());
        assert!(check_batch_size(500, 500).is_ok());

        let empty = check_batch_size(0, 500).unwrap_err();
        assert_eq!(empty.kind, ErrorKind::Validation);

        let over = check_batch_size(501, 500).unwrap_err();
        assert_eq!(over.kind, ErrorKind::Validation);
        assert!(over.message.contains("500"));
    }

    #[test]
    fn test_bulk_metadata_carries_batch_and_request() {
        let session = AuthSession {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            email: "m@example.com".into(),
            name: None,
            role: Role::Manager,
        };
        let ctx = RequestContext::new(&session, "192.0.2.1".into(), None);
        let batch_id = Uuid::now_v7();

        let meta = bulk_metadata(&ctx, batch_id);
        assert_eq!(meta.source, ChangeSource::Bulk);
        assert_eq!(meta.batch_id, Some(batch_id));
        assert_eq!(meta.request_id, Some(ctx.request_id));
        assert!(meta.validate().is_ok());
    }
}
