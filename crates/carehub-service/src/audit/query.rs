//! Read side of the audit ledger.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use carehub_core::error::AppError;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_database::repositories::AuditRepository;
use carehub_entity::audit::{AuditLog, AuditLogFilter, EntityChange};

/// Answers history and search queries over recorded changes and actions.
#[derive(Debug, Clone)]
pub struct AuditQueryService {
    /// Audit repository.
    audit_repo: Arc<AuditRepository>,
}

impl AuditQueryService {
    /// Creates a new audit query service.
    pub fn new(audit_repo: Arc<AuditRepository>) -> Self {
        Self { audit_repo }
    }

    /// The change history of one entity, newest first.
    pub async fn entity_history(
        &self,
        entity_type: &str,
        entity_id: &str,
        page: PageRequest,
    ) -> Result<PageResponse<EntityChange>, AppError> {
        if entity_type.trim().is_empty() || entity_id.trim().is_empty() {
            return Err(AppError::validation(
                "entityType and entityId are both required",
            ));
        }

        debug!(entity_type, entity_id, page = page.page, "Loading entity history");
        self.audit_repo
            .entity_history(entity_type, entity_id, &page)
            .await
    }

    /// A single change with its field changes.
    pub async fn get_change(&self, id: Uuid) -> Result<EntityChange, AppError> {
        self.audit_repo
            .find_change(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Entity change {id} not found")))
    }

    /// Search audit log rows; every filter must match.
    pub async fn search_logs(
        &self,
        filters: &[AuditLogFilter],
        page: PageRequest,
    ) -> Result<PageResponse<AuditLog>, AppError> {
        self.audit_repo.search_logs(filters, &page).await
    }
}
