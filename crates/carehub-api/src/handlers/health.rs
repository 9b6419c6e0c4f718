//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use carehub_core::traits::CacheProvider;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
///
/// Unguarded. Answers 503 when the database or cache is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.db.health_check().await {
        Ok(up) => up,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };
    let cache = match state.cache.health_check().await {
        Ok(up) => up,
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            false
        }
    };

    let status = if database && cache {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: availability(database),
            cache: availability(cache),
        }),
    )
}

fn availability(up: bool) -> String {
    if up { "connected" } else { "unavailable" }.to_string()
}
