//! Start the CareHub server.

use clap::Args;

use carehub_core::config::AppConfig;
use carehub_core::error::AppError;
use carehub_database::migration::run_migrations;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Skip database migrations on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }

    println!("Starting CareHub server...");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);

    let db = super::connect_db(&config).await?;

    if !args.no_migrate {
        run_migrations(db.pool()).await?;
        println!("  Migrations applied successfully.");
    }

    carehub_api::run_server(config, db).await
}
