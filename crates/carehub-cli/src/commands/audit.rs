//! Change ledger and audit log CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use carehub_core::config::AppConfig;
use carehub_core::error::AppError;
use carehub_core::types::pagination::PageRequest;
use carehub_database::repositories::AuditRepository;
use carehub_entity::audit::{AuditAction, AuditLog, AuditLogFilter, EntityChange};
use carehub_service::AuditQueryService;

use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Show the change history of one entity, newest first
    Changes {
        /// Entity type, e.g. Client or Staff
        entity_type: String,
        /// Entity ID
        entity_id: String,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Number of results
        #[arg(short, long, default_value = "20")]
        limit: u64,
    },
    /// Show one change with its field-level deltas
    Change {
        /// Entity change ID
        id: Uuid,
    },
    /// Search the audit log
    Logs {
        /// Filter by action, e.g. BULK_DELETE
        #[arg(short, long)]
        action: Option<String>,
        /// Filter by acting user ID
        #[arg(long)]
        user: Option<Uuid>,
        /// Filter by entity type
        #[arg(long)]
        entity_type: Option<String>,
        /// Filter by entity ID
        #[arg(long)]
        entity_id: Option<String>,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Number of results
        #[arg(short, long, default_value = "50")]
        limit: u64,
    },
}

/// Entity change display row
#[derive(Debug, Serialize, Tabled)]
struct ChangeRow {
    /// Change ID
    id: String,
    /// Time
    time: String,
    /// Change type
    change: String,
    /// Acting user
    changed_by: String,
    /// Changed fields
    fields: String,
}

impl From<&EntityChange> for ChangeRow {
    fn from(c: &EntityChange) -> Self {
        Self {
            id: c.id.to_string(),
            time: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            change: c.change_type.to_string(),
            changed_by: c.changed_by.map(|u| u.to_string()).unwrap_or_default(),
            fields: c
                .field_changes
                .iter()
                .map(|f| f.field_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Field change display row
#[derive(Debug, Serialize, Tabled)]
struct FieldRow {
    /// Field name
    field: String,
    /// Value before
    old: String,
    /// Value after
    new: String,
}

/// Audit log display row
#[derive(Debug, Serialize, Tabled)]
struct LogRow {
    /// Time
    time: String,
    /// Action
    action: String,
    /// Entity type
    entity_type: String,
    /// Entity ID
    entity_id: String,
    /// Acting user
    user: String,
    /// IP
    ip: String,
}

impl From<&AuditLog> for LogRow {
    fn from(l: &AuditLog) -> Self {
        Self {
            time: l.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: l.action.to_string(),
            entity_type: l.entity_type.clone().unwrap_or_default(),
            entity_id: l.entity_id.clone().unwrap_or_default(),
            user: l.user_id.map(|u| u.to_string()).unwrap_or_default(),
            ip: l.ip_address.clone().unwrap_or_default(),
        }
    }
}

/// Execute audit commands
pub async fn execute(
    args: &AuditArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = super::connect_db(config).await?;
    let audit = AuditQueryService::new(Arc::new(AuditRepository::new(db.pool().clone())));

    match &args.command {
        AuditCommand::Changes {
            entity_type,
            entity_id,
            page,
            limit,
        } => {
            let history = audit
                .entity_history(entity_type, entity_id, PageRequest::new(*page, *limit))
                .await?;

            match format {
                OutputFormat::Json => output::print_item(&history, format),
                OutputFormat::Table => {
                    let rows: Vec<ChangeRow> = history.data.iter().map(ChangeRow::from).collect();
                    output::print_list(&rows, format);
                    print_page_footer(history.metadata.total, *page, history.metadata.total_pages);
                }
            }
        }
        AuditCommand::Change { id } => {
            let change = audit.get_change(*id).await?;

            match format {
                OutputFormat::Json => output::print_item(&change, format),
                OutputFormat::Table => {
                    output::print_kv("Entity", &format!("{} {}", change.entity_type, change.entity_id));
                    output::print_kv("Change", &change.change_type.to_string());
                    output::print_kv(
                        "Changed by",
                        &change.changed_by.map(|u| u.to_string()).unwrap_or_default(),
                    );
                    if let Some(reason) = &change.change_reason {
                        output::print_kv("Reason", reason);
                    }
                    let rows: Vec<FieldRow> = change
                        .field_changes
                        .iter()
                        .map(|f| FieldRow {
                            field: f.field_name.clone(),
                            old: display_value(f.old_value.as_ref()),
                            new: display_value(f.new_value.as_ref()),
                        })
                        .collect();
                    output::print_list(&rows, format);
                }
            }
        }
        AuditCommand::Logs {
            action,
            user,
            entity_type,
            entity_id,
            page,
            limit,
        } => {
            let mut filters = Vec::new();
            if let Some(action) = action {
                filters.push(AuditLogFilter::Action(action.parse::<AuditAction>()?));
            }
            if let Some(user) = user {
                filters.push(AuditLogFilter::User(*user));
            }
            if let Some(entity_type) = entity_type {
                filters.push(AuditLogFilter::EntityType(entity_type.clone()));
            }
            if let Some(entity_id) = entity_id {
                filters.push(AuditLogFilter::EntityId(entity_id.clone()));
            }

            let logs = audit
                .search_logs(&filters, PageRequest::new(*page, *limit))
                .await?;

            match format {
                OutputFormat::Json => output::print_item(&logs, format),
                OutputFormat::Table => {
                    let rows: Vec<LogRow> = logs.data.iter().map(LogRow::from).collect();
                    output::print_list(&rows, format);
                    print_page_footer(logs.metadata.total, *page, logs.metadata.total_pages);
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

fn display_value(value: Option<&serde_json::Value>) -> String {
    match value {
        None => "-".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn print_page_footer(total: u64, page: u64, total_pages: u64) {
    println!("{total} total, page {page} of {}", total_pages.max(1));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(None), "-");
        assert_eq!(display_value(Some(&json!("Finance"))), "Finance");
        assert_eq!(display_value(Some(&json!(3))), "3");
        assert_eq!(display_value(Some(&json!(null))), "null");
    }
}
