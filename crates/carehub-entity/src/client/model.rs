//! Client entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use carehub_core::types::patch::nullable;

/// Audit entity type tag for clients.
pub const CLIENT_ENTITY: &str = "Client";

/// An employer organization whose staff receive care services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    /// Unique client identifier.
    pub id: Uuid,
    /// Organization name (unique, case-insensitive).
    pub name: String,
    /// Industry sector.
    pub industry: Option<String>,
    /// Primary contact email.
    pub contact_email: Option<String>,
    /// Primary contact phone.
    pub contact_phone: Option<String>,
    /// Whether the contract is active.
    pub is_active: bool,
    /// When the client was created.
    pub created_at: DateTime<Utc>,
    /// When the client was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    /// Organization name.
    pub name: String,
    /// Industry sector.
    pub industry: Option<String>,
    /// Primary contact email.
    pub contact_email: Option<String>,
    /// Primary contact phone.
    pub contact_phone: Option<String>,
    /// Whether the contract is active.
    pub is_active: bool,
}

/// Partial update of a client. Absent fields are left untouched and are
/// not serialized, so the patch doubles as the "new" side of an update diff.
/// Optional columns take `Some(None)` (JSON `null`) to clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    /// New organization name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New industry sector, or `Some(None)` to clear it.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub industry: Option<Option<String>>,
    /// New contact email.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_email: Option<Option<String>>,
    /// New contact phone.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_phone: Option<Option<String>>,
    /// New active flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ClientPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_can_clear_optional_columns() {
        let patch: ClientPatch =
            serde_json::from_str(r#"{"industry": null, "contact_phone": "555-0100"}"#).unwrap();

        assert_eq!(patch.name, None);
        assert_eq!(patch.industry, Some(None));
        assert_eq!(patch.contact_phone, Some(Some("555-0100".to_string())));
        assert!(!patch.is_empty());
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"industry": null, "contact_phone": "555-0100"})
        );
    }
}
