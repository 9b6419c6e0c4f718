//! Typed filters for audit log searches.

use uuid::Uuid;

use super::kind::AuditAction;

/// A single restriction on an audit log search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditLogFilter {
    /// Rows recording this action.
    Action(AuditAction),
    /// Rows attributed to this user.
    User(Uuid),
    /// Rows about this entity type.
    EntityType(String),
    /// Rows about this entity id.
    EntityId(String),
}
