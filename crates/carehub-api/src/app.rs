//! Server assembly: outer middleware, startup wiring and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use carehub_cache::CacheManager;
use carehub_core::config::AppConfig;
use carehub_core::error::AppError;
use carehub_database::DatabasePool;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::panic::handle_panic;
use crate::router::build_router;
use crate::state::AppState;

/// Build the complete application with the outer middleware stack.
///
/// The panic catcher sits inside tracing so a panicking request is still
/// logged with its 500.
pub fn build_app(state: AppState) -> Router {
    let server = &state.config.server;
    let cors = build_cors_layer(&server.cors);
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(CatchPanicLayer::custom(handle_panic));

    build_router(state).layer(layers)
}

/// Wire the application over a connected (and migrated) database and
/// serve until a shutdown signal arrives.
pub async fn run_server(config: AppConfig, db: DatabasePool) -> Result<(), AppError> {
    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    info!(provider = %config.cache.provider, "Cache ready");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::build(config, db.clone(), cache);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("CareHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    db.close().await;
    info!("CareHub server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
