//! CareHub server: employee-wellness administration back end.
//!
//! Loads configuration, sets up logging, connects and migrates the
//! database, then serves the HTTP API until interrupted.

use tracing_subscriber::{EnvFilter, fmt};

use carehub_core::config::{AppConfig, LoggingConfig};
use carehub_core::error::AppError;
use carehub_database::DatabasePool;
use carehub_database::migration::run_migrations;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from the file named by `CAREHUB_CONFIG`, the
/// defaults, and `CAREHUB__*` environment variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("CAREHUB_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CareHub v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;

    carehub_api::run_server(config, db).await
}
