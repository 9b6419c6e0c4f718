//! Client handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use carehub_core::types::Role;
use carehub_core::types::pagination::PageResponse;
use carehub_entity::client::{Client, ClientSortField};

use crate::dto::request::{ClientListQuery, CreateClientRequest, UpdateClientRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::path::parse_uuid;
use crate::extractors::{ApiQuery, AuthContext, PaginationParams, SortParams, ValidatedJson};
use crate::state::AppState;

/// GET /api/clients
pub async fn list_clients(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiQuery(page): ApiQuery<PaginationParams>,
    ApiQuery(sort): ApiQuery<SortParams>,
    ApiQuery(query): ApiQuery<ClientListQuery>,
) -> ApiResult<Json<PageResponse<Client>>> {
    let (field, direction) = sort.parse::<ClientSortField>()?;
    let result = state
        .client_service
        .list(&query.filters(), field, direction, page.into_page_request())
        .await?;
    Ok(Json(result))
}

/// GET /api/clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    let client = state.client_service.get(parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(client)))
}

/// POST /api/clients
pub async fn create_client(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Client>>)> {
    auth.require(Role::Manager)?;
    let client = state.client_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(client))))
}

/// PUT /api/clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateClientRequest>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    auth.require(Role::Manager)?;
    let client = state
        .client_service
        .update(&auth, parse_uuid(&id)?, req.into())
        .await?;
    Ok(Json(ApiResponse::ok(client)))
}

/// DELETE /api/clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    auth.require(Role::Manager)?;
    let removed = state.client_service.delete(&auth, parse_uuid(&id)?).await?;
    Ok(Json(ApiResponse::ok(removed)))
}
