//! Route definitions for the CareHub HTTP API.
//!
//! All routes are mounted under `/api`. Everything except `/api/health`
//! runs behind [`api_guard`].

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware::{self, api_guard};
use crate::state::AppState;

/// Build the Axum router with all routes and route-level middleware.
pub fn build_router(state: AppState) -> Router {
    let guarded = Router::new()
        .merge(client_routes())
        .merge(staff_routes())
        .merge(audit_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.guard.clone(),
            api_guard,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(guarded);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Client CRUD
fn client_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/clients",
            get(handlers::client::list_clients).post(handlers::client::create_client),
        )
        .route(
            "/clients/{id}",
            get(handlers::client::get_client)
                .put(handlers::client::update_client)
                .delete(handlers::client::delete_client),
        )
}

/// Staff CRUD and bulk operations
fn staff_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/staff",
            get(handlers::staff::list_staff).post(handlers::staff::create_staff),
        )
        .route("/staff/bulk", post(handlers::staff::bulk_staff))
        .route(
            "/staff/{id}",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::delete_staff),
        )
}

/// Audit ledger reads (admin)
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/audit/changes", get(handlers::audit::entity_history))
        .route("/audit/changes/{id}", get(handlers::audit::get_change))
        .route("/audit/logs", get(handlers::audit::search_logs))
}
