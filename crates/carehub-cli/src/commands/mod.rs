//! CLI command definitions and dispatch.

pub mod audit;
pub mod migrate;
pub mod serve;
pub mod token;

use clap::{Parser, Subcommand};

use carehub_core::config::AppConfig;
use carehub_core::error::AppError;
use carehub_database::DatabasePool;

use crate::output::OutputFormat;

/// CareHub: employee-wellness administration back end
#[derive(Debug, Parser)]
#[command(name = "carehub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the CareHub server
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Operator token management
    Token(token::TokenArgs),
    /// Change ledger and audit log
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Whether this invocation starts the server.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve(_))
    }

    /// Execute the CLI command
    pub async fn execute(self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Token(args) => token::execute(args, &config, self.format).await,
            Commands::Audit(args) => audit::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: connect to the configured database
pub async fn connect_db(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
