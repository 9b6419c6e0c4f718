//! Staff handlers, including bulk operations.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::info;

use carehub_core::types::Role;
use carehub_core::types::pagination::PageResponse;
use carehub_entity::staff::{Staff, StaffSortField};

use crate::dto::request::{
    BulkStaffRequest, CreateStaffRequest, StaffListQuery, UpdateStaffRequest,
};
use crate::dto::response::{ApiResponse, BulkResponse};
use crate::error::ApiResult;
use crate::extractors::path::parse_uuid;
use crate::extractors::{ApiJson, ApiQuery, AuthContext, PaginationParams, SortParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/staff
pub async fn list_staff(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiQuery(page): ApiQuery<PaginationParams>,
    ApiQuery(sort): ApiQuery<SortParams>,
    ApiQuery(query): ApiQuery<StaffListQuery>,
) -> ApiResult<Json<PageResponse<Staff>>> {
    let (field, direction) = sort.parse::<StaffSortField>()?;
    let result = state
        .staff_service
        .list(&query.filters(), field, direction, page.into_page_request())
        .await?;
    Ok(Json(result))
}

/// GET /api/staff/{id}
pub async fn get_staff(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Staff>>> {
    let staff = state.staff_service.get(parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(staff)))
}

/// POST /api/staff
pub async fn create_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateStaffRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Staff>>)> {
    auth.require(Role::Manager)?;
    let staff = state.staff_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(staff))))
}

/// PUT /api/staff/{id}
pub async fn update_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateStaffRequest>,
) -> ApiResult<Json<ApiResponse<Staff>>> {
    auth.require(Role::Manager)?;
    let staff = state
        .staff_service
        .update(&auth, parse_uuid(&id)?, req.into())
        .await?;
    Ok(Json(ApiResponse::ok(staff)))
}

/// DELETE /api/staff/{id}
pub async fn delete_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Staff>>> {
    auth.require(Role::Manager)?;
    let removed = state.staff_service.delete(&auth, parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// POST /api/staff/bulk
///
/// All-or-nothing: one bad item or missing id rejects the whole batch.
pub async fn bulk_staff(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<BulkStaffRequest>,
) -> ApiResult<Json<BulkResponse<Staff>>> {
    auth.require(Role::Manager)?;
    req.check()?;

    let operation = req.operation().to_string();
    let rows = match req {
        BulkStaffRequest::Create { items } => {
            let items = items.into_iter().map(Into::into).collect();
            state.staff_service.bulk_create(&auth, items).await?
        }
        BulkStaffRequest::Update { items } => {
            let items = items.into_iter().map(Into::into).collect();
            state.staff_service.bulk_update(&auth, items).await?
        }
        BulkStaffRequest::Delete { ids } => state.staff_service.bulk_delete(&auth, ids).await?,
    };

    info!(%operation, count = rows.len(), user_id = %auth.user_id, "Bulk staff request completed");

    Ok(Json(BulkResponse {
        operation,
        count: rows.len(),
        data: rows,
    }))
}
