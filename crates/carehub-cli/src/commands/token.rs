//! Operator token commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;

use carehub_auth::{JwtDecoder, JwtEncoder};
use carehub_cache::CacheManager;
use carehub_core::config::AppConfig;
use carehub_core::error::AppError;
use carehub_core::types::Role;
use uuid::Uuid;

use crate::output::{self, OutputFormat};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a bearer token for an operator
    Issue {
        /// Operator email
        #[arg(long)]
        email: String,
        /// Role: admin, manager, counselor or viewer
        #[arg(short, long, default_value = "viewer")]
        role: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// User ID (a new one is generated when omitted)
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Skip the confirmation prompt for admin tokens
        #[arg(short, long)]
        yes: bool,
    },
    /// Revoke a previously issued token
    Revoke {
        /// The bearer token
        token: String,
    },
}

/// Token display for JSON output
#[derive(Debug, Serialize)]
struct IssuedTokenView {
    token: String,
    user_id: Uuid,
    session_id: Uuid,
    jti: Uuid,
    role: Role,
    expires_at: String,
}

/// Execute token commands
pub async fn execute(
    args: &TokenArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Issue {
            email,
            role,
            name,
            user_id,
            yes,
        } => {
            let role: Role = role.parse()?;
            if role == Role::Admin && !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Issue an admin token for {email}?"))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let user_id = user_id.unwrap_or_else(Uuid::new_v4);
            let issued = JwtEncoder::new(&config.auth).issue(user_id, email, name.as_deref(), role)?;

            let view = IssuedTokenView {
                token: issued.token,
                user_id,
                session_id: issued.session_id,
                jti: issued.jti,
                role,
                expires_at: issued.expires_at.to_rfc3339(),
            };

            match format {
                OutputFormat::Json => output::print_item(&view, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Issued {role} token for {email}"));
                    output::print_kv("User ID", &view.user_id.to_string());
                    output::print_kv("Session ID", &view.session_id.to_string());
                    output::print_kv("Expires", &view.expires_at);
                    println!();
                    println!("{}", view.token);
                }
            }
        }
        TokenCommand::Revoke { token } => {
            if config.cache.provider != "redis" {
                output::print_warning(
                    "The in-memory cache is per process; revocation will not reach a running server.",
                );
            }

            let cache = Arc::new(CacheManager::new(&config.cache).await?);
            let decoder = JwtDecoder::new(&config.auth, cache);
            let claims = decoder.decode(token).await?;
            decoder.revoke(&claims).await?;

            output::print_success(&format!("Revoked token {} for {}", claims.jti, claims.email));
        }
    }

    Ok(())
}
