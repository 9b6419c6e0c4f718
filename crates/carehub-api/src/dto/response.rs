//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Single-resource wrapper: `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload.
    pub fn ok(data: T) -> Self {
        Self { data }
    }
}

/// Result of a bulk staff operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResponse<T> {
    /// `create`, `update` or `delete`.
    pub operation: String,
    /// Number of rows affected.
    pub count: usize,
    /// The affected rows.
    pub data: Vec<T>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when every dependency answered, otherwise `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// `connected` or `unavailable`.
    pub database: String,
    /// `connected` or `unavailable`.
    pub cache: String,
}
