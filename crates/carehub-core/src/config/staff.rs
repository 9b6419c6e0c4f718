//! Staff management configuration.

use serde::{Deserialize, Serialize};

/// Limits for staff operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffConfig {
    /// Maximum number of items accepted by one bulk request.
    #[serde(default = "default_max_bulk_size")]
    pub max_bulk_size: usize,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            max_bulk_size: default_max_bulk_size(),
        }
    }
}

fn default_max_bulk_size() -> usize {
    500
}
