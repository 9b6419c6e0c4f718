//! Enumerated tags used by the audit ledger.
//!
//! Both enums parse case-insensitively, so `"update"`, `"Update"` and
//! `"UPDATE"` all normalize to the canonical upper-case variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use carehub_core::AppError;

/// The kind of mutation recorded by an entity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "change_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// The entity was created.
    Create,
    /// One or more fields of the entity were changed.
    Update,
    /// The entity was removed.
    Delete,
}

impl ChangeType {
    /// Return the canonical tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::validation(format!(
                "Invalid change type: '{s}'. Expected one of: CREATE, UPDATE, DELETE"
            ))),
        }
    }
}

/// Action verbs recorded in the coarse audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A single entity was created.
    Create,
    /// A single entity was updated.
    Update,
    /// A single entity was deleted.
    Delete,
    /// Several entities were created in one transaction.
    BulkCreate,
    /// Several entities were updated in one transaction.
    BulkUpdate,
    /// Several entities were deleted in one transaction.
    BulkDelete,
    /// A user signed in.
    Login,
    /// A user signed out.
    Logout,
    /// A request was refused by the rate limiter.
    RateLimit,
    /// An authenticated caller lacked the required role.
    AccessDenied,
}

impl AuditAction {
    /// Every action, in declaration order.
    pub const ALL: [AuditAction; 10] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::BulkCreate,
        Self::BulkUpdate,
        Self::BulkDelete,
        Self::Login,
        Self::Logout,
        Self::RateLimit,
        Self::AccessDenied,
    ];

    /// Return the canonical tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::BulkCreate => "BULK_CREATE",
            Self::BulkUpdate => "BULK_UPDATE",
            Self::BulkDelete => "BULK_DELETE",
            Self::Login => "LOGIN",
            Self::Logout => "LOGOUT",
            Self::RateLimit => "RATE_LIMIT",
            Self::AccessDenied => "ACCESS_DENIED",
        }
    }
}

impl From<ChangeType> for AuditAction {
    fn from(change: ChangeType) -> Self {
        match change {
            ChangeType::Create => Self::Create,
            ChangeType::Update => Self::Update,
            ChangeType::Delete => Self::Delete,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| AppError::validation(format!("Invalid audit action: '{s}'")))
    }
}
