//! Change and action logging over an [`AuditStore`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use carehub_core::result::AppResult;
use carehub_entity::audit::{
    AuditAction, AuditLog, ChangeMetadata, ChangeType, EntityChange, NewAuditLog, NewEntityChange,
};

use super::diff::compute_field_changes;
use super::store::AuditStore;

/// Everything needed to record one entity mutation.
///
/// Payloads are converted to JSON values on construction, so the record
/// never aliases the caller's live objects.
#[derive(Debug, Clone)]
pub struct EntityChangeInput {
    /// Entity type tag (e.g. `"Client"`).
    pub entity_type: String,
    /// Identifier of the changed entity.
    pub entity_id: String,
    /// Kind of mutation.
    pub change_type: ChangeType,
    /// Snapshot before the change.
    pub old_data: Option<Value>,
    /// Snapshot (or partial patch) after the change.
    pub new_data: Option<Value>,
    /// The acting user.
    pub changed_by: Option<Uuid>,
    /// Free-text reason.
    pub change_reason: Option<String>,
    /// Where the change came from.
    pub metadata: ChangeMetadata,
}

impl EntityChangeInput {
    fn new(
        entity_type: &str,
        entity_id: impl ToString,
        change_type: ChangeType,
        old_data: Option<Value>,
        new_data: Option<Value>,
    ) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            change_type,
            old_data,
            new_data,
            changed_by: None,
            change_reason: None,
            metadata: ChangeMetadata::default(),
        }
    }

    /// A newly created entity.
    pub fn created<T: Serialize>(
        entity_type: &str,
        entity_id: impl ToString,
        created: &T,
    ) -> AppResult<Self> {
        let new_data = serde_json::to_value(created)?;
        Ok(Self::new(entity_type, entity_id, ChangeType::Create, None, Some(new_data)))
    }

    /// An update; `patch` should serialize only the fields it sets.
    pub fn updated<B: Serialize, P: Serialize>(
        entity_type: &str,
        entity_id: impl ToString,
        before: &B,
        patch: &P,
    ) -> AppResult<Self> {
        let old_data = serde_json::to_value(before)?;
        let new_data = serde_json::to_value(patch)?;
        Ok(Self::new(
            entity_type,
            entity_id,
            ChangeType::Update,
            Some(old_data),
            Some(new_data),
        ))
    }

    /// A removed entity.
    pub fn deleted<T: Serialize>(
        entity_type: &str,
        entity_id: impl ToString,
        removed: &T,
    ) -> AppResult<Self> {
        let old_data = serde_json::to_value(removed)?;
        Ok(Self::new(entity_type, entity_id, ChangeType::Delete, Some(old_data), None))
    }

    /// Attribute the change to a user.
    pub fn by(mut self, user_id: Uuid) -> Self {
        self.changed_by = Some(user_id);
        self
    }

    /// Attach a reason.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.change_reason = Some(reason.into());
        self
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: ChangeMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Everything needed to record one audit action.
#[derive(Debug, Clone)]
pub struct AuditActionInput {
    /// The action performed.
    pub action: AuditAction,
    /// Type of the affected entity.
    pub entity_type: Option<String>,
    /// Identifier of the affected entity.
    pub entity_id: Option<String>,
    /// Opaque payload.
    pub data: Option<Value>,
    /// Caller IP address.
    pub ip_address: Option<String>,
    /// Caller User-Agent.
    pub user_agent: Option<String>,
    /// The acting user.
    pub user_id: Option<Uuid>,
}

impl AuditActionInput {
    /// An action with no entity, payload or caller details yet.
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            entity_type: None,
            entity_id: None,
            data: None,
            ip_address: None,
            user_agent: None,
            user_id: None,
        }
    }

    /// Name the affected entity type.
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Name the affected entity.
    pub fn entity(mut self, entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Attach a payload.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Record where the request came from.
    pub fn client(mut self, ip_address: impl Into<String>, user_agent: Option<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = user_agent;
        self
    }

    /// Attribute the action to a user.
    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

impl From<AuditActionInput> for NewAuditLog {
    fn from(input: AuditActionInput) -> Self {
        Self {
            action: input.action,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            data: input.data,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            user_id: input.user_id,
        }
    }
}

/// Computes field diffs and persists changes and actions.
///
/// Persistence failures propagate; see
/// [`AuditTrail`](super::trail::AuditTrail) for the retrying, non-failing
/// wrapper services use.
#[derive(Debug, Clone)]
pub struct ChangeLogger {
    store: Arc<dyn AuditStore>,
}

impl ChangeLogger {
    /// Creates a logger over the given store.
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Record one entity change and its field changes.
    pub async fn log_entity_change(&self, input: EntityChangeInput) -> AppResult<EntityChange> {
        let change = self.prepare(input)?;
        self.persist(&change).await
    }

    /// Record one audit action.
    pub async fn log_audit_action(&self, input: AuditActionInput) -> AppResult<AuditLog> {
        self.store.insert_audit_log(&input.into()).await
    }

    /// Validate the input, compute its diff and assign the change id.
    pub fn prepare(&self, input: EntityChangeInput) -> AppResult<NewEntityChange> {
        input.metadata.validate()?;

        let field_changes = compute_field_changes(
            input.old_data.as_ref().and_then(Value::as_object),
            input.new_data.as_ref().and_then(Value::as_object),
            input.change_type,
        );

        debug!(
            entity_type = %input.entity_type,
            entity_id = %input.entity_id,
            change_type = %input.change_type,
            fields = field_changes.len(),
            "Prepared entity change"
        );

        Ok(NewEntityChange {
            id: Uuid::now_v7(),
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            change_type: input.change_type,
            old_data: input.old_data,
            new_data: input.new_data,
            changed_by: input.changed_by,
            change_reason: input.change_reason,
            metadata: Some(serde_json::to_value(&input.metadata)?),
            field_changes,
        })
    }

    /// Write a prepared change. Safe to repeat with the same value.
    pub async fn persist(&self, change: &NewEntityChange) -> AppResult<EntityChange> {
        self.store.insert_entity_change(change).await
    }
}
