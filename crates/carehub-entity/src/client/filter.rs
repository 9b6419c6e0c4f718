//! Typed filters and sort fields for client listings.

use std::str::FromStr;

use carehub_core::AppError;

/// A single restriction on a client listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFilter {
    /// Case-insensitive substring match on name or contact email.
    Search(String),
    /// Match on the active flag.
    Active(bool),
}

/// Columns a client listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientSortField {
    /// Organization name.
    #[default]
    Name,
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl ClientSortField {
    /// The SQL column for this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for ClientSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "updatedAt" | "updated_at" => Ok(Self::UpdatedAt),
            _ => Err(AppError::validation(format!("Cannot sort clients by '{s}'"))),
        }
    }
}
