//! Pagination and sorting query parameters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use carehub_core::error::AppError;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::PageRequest;

/// `?page=&limit=` on list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    pub page: Option<u64>,
    /// Items per page (default: 10, max: 100).
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Converts to a `PageRequest`, clamping out-of-range values.
    pub fn into_page_request(self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.limit.unwrap_or(defaults.limit),
        )
    }
}

/// `?sortBy=&sortDir=` on list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParams {
    /// Field to sort by; each list names its own fields.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_dir: Option<String>,
}

impl SortParams {
    /// Parse into a typed sort field and direction, using defaults for
    /// anything absent.
    pub fn parse<F>(&self) -> Result<(F, SortDirection), AppError>
    where
        F: FromStr<Err = AppError> + Default,
    {
        let field = match self.sort_by.as_deref() {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => F::default(),
        };
        let direction = match self.sort_dir.as_deref() {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => SortDirection::default(),
        };
        Ok((field, direction))
    }
}
