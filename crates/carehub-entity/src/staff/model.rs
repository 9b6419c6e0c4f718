//! Staff entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use carehub_core::types::patch::nullable;

/// Audit entity type tag for staff.
pub const STAFF_ENTITY: &str = "Staff";

/// An employee of a client, eligible for care services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Staff {
    /// Unique staff identifier.
    pub id: Uuid,
    /// Employing client.
    pub client_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Work email (unique per client).
    pub email: String,
    /// Job title.
    pub job_title: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Whether the staff member is currently eligible.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    /// Employing client.
    pub client_id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Work email.
    pub email: String,
    /// Job title.
    pub job_title: Option<String>,
    /// Department.
    pub department: Option<String>,
    /// Whether the staff member is eligible.
    pub is_active: bool,
}

/// Partial update of a staff member; absent fields are untouched and an
/// explicit `null` clears an optional column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffPatch {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New work email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New job title.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_title: Option<Option<String>>,
    /// New department.
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub department: Option<Option<String>>,
    /// New eligibility flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl StaffPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One item of a bulk update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffUpdate {
    /// Staff member to update.
    pub id: Uuid,
    /// Fields to change.
    pub patch: StaffPatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_department_is_a_change() {
        let patch: StaffPatch = serde_json::from_str(r#"{"department": null}"#).unwrap();
        assert_eq!(patch.department, Some(None));
        assert_eq!(patch.job_title, None);
        assert!(!patch.is_empty());

        let untouched: StaffPatch = serde_json::from_str("{}").unwrap();
        assert!(untouched.is_empty());
    }
}
