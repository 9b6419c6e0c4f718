//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use carehub_core::error::AppError;
use carehub_core::types::patch::nullable;
use carehub_entity::audit::{AuditAction, AuditLogFilter};
use carehub_entity::client::{ClientFilter, ClientPatch, NewClient};
use carehub_entity::staff::{NewStaff, StaffFilter, StaffPatch, StaffUpdate};

use crate::error::validation_message;

fn default_active() -> bool {
    true
}

/// Create client request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClientRequest {
    /// Organization name.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    /// Industry sector.
    #[validate(length(max = 100))]
    pub industry: Option<String>,
    /// Primary contact email.
    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: Option<String>,
    /// Primary contact phone.
    #[validate(length(max = 50))]
    pub contact_phone: Option<String>,
    /// Whether the client is active (default: true).
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<CreateClientRequest> for NewClient {
    fn from(req: CreateClientRequest) -> Self {
        Self {
            name: req.name,
            industry: req.industry,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
            is_active: req.is_active,
        }
    }
}

/// Partial client update; absent fields are left unchanged and an explicit
/// `null` clears an optional column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateClientRequest {
    /// Organization name.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    /// Industry sector.
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "nullable")]
    pub industry: Option<Option<String>>,
    /// Primary contact email.
    #[validate(email(message = "must be a valid email address"))]
    #[serde(default, deserialize_with = "nullable")]
    pub contact_email: Option<Option<String>>,
    /// Primary contact phone.
    #[validate(length(max = 50))]
    #[serde(default, deserialize_with = "nullable")]
    pub contact_phone: Option<Option<String>>,
    /// Whether the client is active.
    pub is_active: Option<bool>,
}

impl From<UpdateClientRequest> for ClientPatch {
    fn from(req: UpdateClientRequest) -> Self {
        Self {
            name: req.name,
            industry: req.industry,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
            is_active: req.is_active,
        }
    }
}

/// Create staff request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStaffRequest {
    /// Employer.
    pub client_id: Uuid,
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: String,
    /// Work email, unique per client.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Job title.
    #[validate(length(max = 100))]
    pub job_title: Option<String>,
    /// Department.
    #[validate(length(max = 100))]
    pub department: Option<String>,
    /// Whether the staff member is active (default: true).
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl From<CreateStaffRequest> for NewStaff {
    fn from(req: CreateStaffRequest) -> Self {
        Self {
            client_id: req.client_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            job_title: req.job_title,
            department: req.department,
            is_active: req.is_active,
        }
    }
}

/// Partial staff update; absent fields are left unchanged and an explicit
/// `null` clears an optional column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub first_name: Option<String>,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub last_name: Option<String>,
    /// Work email.
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    /// Job title.
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "nullable")]
    pub job_title: Option<Option<String>>,
    /// Department.
    #[validate(length(max = 100))]
    #[serde(default, deserialize_with = "nullable")]
    pub department: Option<Option<String>>,
    /// Whether the staff member is active.
    pub is_active: Option<bool>,
}

impl From<UpdateStaffRequest> for StaffPatch {
    fn from(req: UpdateStaffRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            job_title: req.job_title,
            department: req.department,
            is_active: req.is_active,
        }
    }
}

/// One row of a bulk update: the id plus the fields to change.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkStaffUpdateItem {
    /// Staff member to update.
    pub id: Uuid,
    /// Fields to change.
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: UpdateStaffRequest,
}

/// `POST /api/staff/bulk` body, selected by `operation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum BulkStaffRequest {
    /// Create every item.
    Create {
        /// Staff to create.
        items: Vec<CreateStaffRequest>,
    },
    /// Update every item.
    Update {
        /// Rows to update.
        items: Vec<BulkStaffUpdateItem>,
    },
    /// Delete every id.
    Delete {
        /// Staff ids to delete.
        ids: Vec<Uuid>,
    },
}

impl BulkStaffRequest {
    /// The operation name, as sent.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Validate every item, naming the first bad one by index.
    pub fn check(&self) -> Result<(), AppError> {
        match self {
            Self::Create { items } => check_items(items.iter().map(Validate::validate)),
            Self::Update { items } => check_items(items.iter().map(Validate::validate)),
            Self::Delete { .. } => Ok(()),
        }
    }
}

fn check_items(results: impl Iterator<Item = Result<(), ValidationErrors>>) -> Result<(), AppError> {
    for (index, result) in results.enumerate() {
        if let Err(errors) = result {
            return Err(AppError::validation(format!(
                "Item {index}: {}",
                validation_message(&errors)
            )));
        }
    }
    Ok(())
}

impl From<BulkStaffUpdateItem> for StaffUpdate {
    fn from(item: BulkStaffUpdateItem) -> Self {
        Self {
            id: item.id,
            patch: item.fields.into(),
        }
    }
}

/// `GET /api/clients` filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListQuery {
    /// Substring of name or contact email.
    pub search: Option<String>,
    /// Only active or inactive clients.
    pub active: Option<bool>,
}

impl ClientListQuery {
    /// Typed filters for the repository.
    pub fn filters(self) -> Vec<ClientFilter> {
        let mut filters = Vec::new();
        if let Some(search) = non_blank(self.search) {
            filters.push(ClientFilter::Search(search));
        }
        if let Some(active) = self.active {
            filters.push(ClientFilter::Active(active));
        }
        filters
    }
}

/// `GET /api/staff` filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffListQuery {
    /// Only staff of this client.
    pub client_id: Option<Uuid>,
    /// Substring of name or email.
    pub search: Option<String>,
    /// Exact department.
    pub department: Option<String>,
    /// Only active or inactive staff.
    pub active: Option<bool>,
}

impl StaffListQuery {
    /// Typed filters for the repository.
    pub fn filters(self) -> Vec<StaffFilter> {
        let mut filters = Vec::new();
        if let Some(client_id) = self.client_id {
            filters.push(StaffFilter::Client(client_id));
        }
        if let Some(search) = non_blank(self.search) {
            filters.push(StaffFilter::Search(search));
        }
        if let Some(department) = non_blank(self.department) {
            filters.push(StaffFilter::Department(department));
        }
        if let Some(active) = self.active {
            filters.push(StaffFilter::Active(active));
        }
        filters
    }
}

/// `GET /api/audit/changes` parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHistoryQuery {
    /// Entity type tag, e.g. `Client`.
    pub entity_type: String,
    /// Entity id.
    pub entity_id: String,
}

/// `GET /api/audit/logs` filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    /// Action name, e.g. `BULK_DELETE`.
    pub action: Option<String>,
    /// Acting user.
    pub user_id: Option<Uuid>,
    /// Entity type tag.
    pub entity_type: Option<String>,
    /// Entity id.
    pub entity_id: Option<String>,
}

impl AuditLogQuery {
    /// Typed filters for the repository.
    pub fn filters(self) -> Result<Vec<AuditLogFilter>, AppError> {
        let mut filters = Vec::new();
        if let Some(action) = non_blank(self.action) {
            filters.push(AuditLogFilter::Action(action.parse::<AuditAction>()?));
        }
        if let Some(user_id) = self.user_id {
            filters.push(AuditLogFilter::User(user_id));
        }
        if let Some(entity_type) = non_blank(self.entity_type) {
            filters.push(AuditLogFilter::EntityType(entity_type));
        }
        if let Some(entity_id) = non_blank(self.entity_id) {
            filters.push(AuditLogFilter::EntityId(entity_id));
        }
        Ok(filters)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bulk_request_is_tagged_by_operation() {
        let body = json!({
            "operation": "update",
            "items": [{"id": "6a2f41a3-c54c-4c5d-8a4b-1e5c9b0e7f10", "department": "Finance"}]
        });
        let req: BulkStaffRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.operation(), "update");

        let BulkStaffRequest::Update { items } = req else {
            panic!("expected update");
        };
        let update: StaffUpdate = items[0].clone().into();
        assert_eq!(update.patch.department, Some(Some("Finance".to_string())));
        assert!(update.patch.first_name.is_none());

        let unknown = serde_json::from_value::<BulkStaffRequest>(json!({"operation": "merge"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_update_null_clears_but_absent_keeps() {
        let req: UpdateClientRequest =
            serde_json::from_value(json!({"industry": null, "contact_phone": "555-0100"})).unwrap();
        assert!(req.validate().is_ok());

        let patch = ClientPatch::from(req);
        assert_eq!(patch.industry, Some(None));
        assert_eq!(patch.contact_phone, Some(Some("555-0100".to_string())));
        assert_eq!(patch.contact_email, None);

        let bad: UpdateStaffRequest =
            serde_json::from_value(json!({"department": "x".repeat(101)})).unwrap();
        assert!(bad.validate().is_err());
        let cleared: UpdateStaffRequest =
            serde_json::from_value(json!({"department": null})).unwrap();
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn test_bulk_check_names_the_bad_item() {
        let good = json!({
            "client_id": "6a2f41a3-c54c-4c5d-8a4b-1e5c9b0e7f10",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com"
        });
        let mut bad = good.clone();
        bad["email"] = json!("not-an-email");

        let req: BulkStaffRequest =
            serde_json::from_value(json!({"operation": "create", "items": [good, bad]})).unwrap();
        let err = req.check().unwrap_err();
        assert!(err.message.starts_with("Item 1:"));
        assert!(err.message.contains("email"));
    }

    #[test]
    fn test_create_client_defaults_to_active() {
        let req: CreateClientRequest = serde_json::from_value(json!({"name": "Acme"})).unwrap();
        assert!(req.is_active);
        assert!(req.validate().is_ok());

        let empty: CreateClientRequest = serde_json::from_value(json!({"name": ""})).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_list_filters_skip_blank_values() {
        let query = ClientListQuery {
            search: Some("  ".into()),
            active: Some(true),
        };
        assert_eq!(query.filters(), vec![ClientFilter::Active(true)]);

        let logs = AuditLogQuery {
            action: Some("bulk_delete".into()),
            entity_type: Some("Staff".into()),
            ..AuditLogQuery::default()
        };
        assert_eq!(
            logs.filters().unwrap(),
            vec![
                AuditLogFilter::Action(AuditAction::BulkDelete),
                AuditLogFilter::EntityType("Staff".into()),
            ]
        );

        let bad = AuditLogQuery {
            action: Some("EXPLODE".into()),
            ..AuditLogQuery::default()
        };
        assert!(bad.filters().is_err());
    }
}
