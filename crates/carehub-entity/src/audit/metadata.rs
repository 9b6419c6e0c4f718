//! Structured metadata attached to every entity change.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carehub_core::AppError;

/// Maximum stored User-Agent length.
const MAX_USER_AGENT_LEN: usize = 512;

/// Where a mutation originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// A single-entity API request.
    #[default]
    Api,
    /// One item of a bulk API request.
    Bulk,
    /// The administrative command line.
    Cli,
    /// Internal maintenance.
    System,
}

/// Closed set of metadata fields recorded with an entity change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMetadata {
    /// Origin of the change.
    pub source: ChangeSource,
    /// Correlates changes made by one HTTP request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Groups the changes of one bulk operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    /// Client IP address, or `"unknown"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client User-Agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ChangeMetadata {
    /// Metadata for a change of the given origin.
    pub fn from_source(source: ChangeSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Validate field formats before the metadata is persisted.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(ip) = &self.ip_address {
            if ip != "unknown" && ip.parse::<IpAddr>().is_err() {
                return Err(AppError::validation(format!(
                    "Invalid metadata ip_address: '{ip}'"
                )));
            }
        }
        if let Some(agent) = &self.user_agent {
            if agent.chars().count() > MAX_USER_AGENT_LEN {
                return Err(AppError::validation(format!(
                    "Metadata user_agent exceeds {MAX_USER_AGENT_LEN} characters"
                )));
            }
        }
        Ok(())
    }
}
