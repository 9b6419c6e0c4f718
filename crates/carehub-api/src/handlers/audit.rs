//! Audit ledger handlers. Admin only.

use axum::Json;
use axum::extract::{Path, State};

use carehub_core::types::Role;
use carehub_core::types::pagination::PageResponse;
use carehub_entity::audit::{AuditLog, EntityChange};

use crate::dto::request::{AuditLogQuery, EntityHistoryQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::path::parse_uuid;
use crate::extractors::{ApiQuery, AuthContext, PaginationParams};
use crate::state::AppState;

/// GET /api/audit/changes?entityType=&entityId=
pub async fn entity_history(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(page): ApiQuery<PaginationParams>,
    ApiQuery(query): ApiQuery<EntityHistoryQuery>,
) -> ApiResult<Json<PageResponse<EntityChange>>> {
    auth.require(Role::Admin)?;
    let history = state
        .audit_query
        .entity_history(&query.entity_type, &query.entity_id, page.into_page_request())
        .await?;
    Ok(Json(history))
}

/// GET /api/audit/changes/{id}
pub async fn get_change(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<EntityChange>>> {
    auth.require(Role::Admin)?;
    let change = state.audit_query.get_change(parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(change)))
}

/// GET /api/audit/logs
pub async fn search_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(page): ApiQuery<PaginationParams>,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> ApiResult<Json<PageResponse<AuditLog>>> {
    auth.require(Role::Admin)?;
    let filters = query.filters()?;
    let logs = state
        .audit_query
        .search_logs(&filters, page.into_page_request())
        .await?;
    Ok(Json(logs))
}
