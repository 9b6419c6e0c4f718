//! Typed filters and sort fields for staff listings.

use std::str::FromStr;

use uuid::Uuid;

use carehub_core::AppError;

/// A single restriction on a staff listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffFilter {
    /// Staff of one client.
    Client(Uuid),
    /// Case-insensitive substring match on names or email.
    Search(String),
    /// Exact department match.
    Department(String),
    /// Match on the active flag.
    Active(bool),
}

/// Columns a staff listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaffSortField {
    /// Family name.
    #[default]
    LastName,
    /// Given name.
    FirstName,
    /// Work email.
    Email,
    /// Creation time.
    CreatedAt,
}

impl StaffSortField {
    /// The SQL column for this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::FirstName => "first_name",
            Self::Email => "email",
            Self::CreatedAt => "created_at",
        }
    }
}

impl FromStr for StaffSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lastName" | "last_name" => Ok(Self::LastName),
            "firstName" | "first_name" => Ok(Self::FirstName),
            "email" => Ok(Self::Email),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            _ => Err(AppError::validation(format!("Cannot sort staff by '{s}'"))),
        }
    }
}
