//! The authenticated session attached to a guarded request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Platform roles, ordered by privilege: Admin > Manager > Counselor > Viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator; may read the audit ledger.
    Admin,
    /// Account manager; may mutate clients and staff.
    Manager,
    /// Service provider delivering care sessions.
    Counselor,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Manager => 3,
            Self::Counselor => 2,
            Self::Viewer => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: Role) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Counselor => "counselor",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "counselor" => Ok(Self::Counselor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: admin, manager, counselor, viewer"
            ))),
        }
    }
}

/// Identity of the caller, resolved once per request by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// Session identifier carried by the token.
    pub session_id: Uuid,
    /// Email address of the user.
    pub email: String,
    /// Display name, when the identity provider supplies one.
    pub name: Option<String>,
    /// Role at the time the token was issued.
    pub role: Role,
}

impl AuthSession {
    /// Fail with an authorization error unless the role is at least `required`.
    pub fn require_role(&self, required: Role) -> Result<(), AppError> {
        if self.role.has_at_least(required) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "{required} access required"
            )))
        }
    }
}
