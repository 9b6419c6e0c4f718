//! Audit ledger row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{AuditAction, ChangeType};

/// An immutable record of one create/update/delete of a tracked entity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityChange {
    /// Unique change identifier.
    pub id: Uuid,
    /// Entity type tag (e.g. `"Client"`, `"Staff"`).
    pub entity_type: String,
    /// Identifier of the changed entity.
    pub entity_id: String,
    /// Kind of mutation.
    pub change_type: ChangeType,
    /// Snapshot before the change.
    pub old_data: Option<serde_json::Value>,
    /// Snapshot (or partial patch) after the change.
    pub new_data: Option<serde_json::Value>,
    /// The user who made the change.
    pub changed_by: Option<Uuid>,
    /// Free-text reason supplied by the caller.
    pub change_reason: Option<String>,
    /// Serialized `ChangeMetadata`.
    pub metadata: Option<serde_json::Value>,
    /// When the change was recorded.
    pub created_at: DateTime<Utc>,
    /// Field-level deltas, in diff order.
    #[sqlx(skip)]
    #[serde(default)]
    pub field_changes: Vec<FieldChange>,
}

/// One field's before/after delta within an [`EntityChange`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FieldChange {
    /// Unique field change identifier.
    pub id: Uuid,
    /// Parent entity change.
    pub entity_change_id: Uuid,
    /// Position within the parent's diff.
    pub position: i32,
    /// Name of the changed field.
    pub field_name: String,
    /// Value before the change; `None` when the field was absent.
    pub old_value: Option<serde_json::Value>,
    /// Value after the change; `None` when the field was absent.
    pub new_value: Option<serde_json::Value>,
    /// Always equal to the parent's change type.
    pub change_type: ChangeType,
}

/// A coarse action record, independent of field diffing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The action that was performed.
    pub action: AuditAction,
    /// Type of the affected entity, if any.
    pub entity_type: Option<String>,
    /// Identifier of the affected entity, if any.
    pub entity_id: Option<String>,
    /// Opaque payload.
    pub data: Option<serde_json::Value>,
    /// IP address of the caller.
    pub ip_address: Option<String>,
    /// User-Agent of the caller.
    pub user_agent: Option<String>,
    /// The acting user.
    pub user_id: Option<Uuid>,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Data required to persist a new entity change.
///
/// The id is chosen by the caller so that retried writes stay idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntityChange {
    /// Pre-assigned change identifier.
    pub id: Uuid,
    /// Entity type tag.
    pub entity_type: String,
    /// Identifier of the changed entity.
    pub entity_id: String,
    /// Kind of mutation.
    pub change_type: ChangeType,
    /// Snapshot before the change.
    pub old_data: Option<serde_json::Value>,
    /// Snapshot after the change.
    pub new_data: Option<serde_json::Value>,
    /// The user who made the change.
    pub changed_by: Option<Uuid>,
    /// Free-text reason.
    pub change_reason: Option<String>,
    /// Serialized metadata.
    pub metadata: Option<serde_json::Value>,
    /// Field-level deltas to insert with the parent.
    pub field_changes: Vec<NewFieldChange>,
}

/// Data for one field change inserted alongside its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFieldChange {
    /// Name of the changed field.
    pub field_name: String,
    /// Value before the change.
    pub old_value: Option<serde_json::Value>,
    /// Value after the change.
    pub new_value: Option<serde_json::Value>,
    /// Mirrors the parent's change type.
    pub change_type: ChangeType,
}

/// Data required to persist a new audit log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditLog {
    /// The action performed.
    pub action: AuditAction,
    /// Type of the affected entity.
    pub entity_type: Option<String>,
    /// Identifier of the affected entity.
    pub entity_id: Option<String>,
    /// Opaque payload.
    pub data: Option<serde_json::Value>,
    /// Caller IP address.
    pub ip_address: Option<String>,
    /// Caller User-Agent.
    pub user_agent: Option<String>,
    /// The acting user.
    pub user_id: Option<Uuid>,
}
