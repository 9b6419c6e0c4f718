//! The CareHub error taxonomy.
//!
//! Every crate reports failures as an [`AppError`]. The [`ErrorKind`]
//! decides how the failure surfaces: the API layer maps it to a status code
//! and the audit trail uses it to decide whether a write is worth retrying.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No such client, staff member or audit record.
    NotFound,
    /// No valid session accompanied the request.
    Authentication,
    /// The session's role is too weak for the operation.
    Authorization,
    /// Malformed or out-of-range input.
    Validation,
    /// The write clashes with existing rows (duplicate name, dependent staff).
    Conflict,
    /// The caller exhausted its request window.
    RateLimit,
    /// A bug or an unexpected state.
    Internal,
    /// PostgreSQL failed or was unreachable.
    Database,
    /// The cache backend failed or was unreachable.
    Cache,
    /// Settings could not be loaded or are inconsistent.
    Configuration,
    /// A payload could not be converted to or from JSON.
    Serialization,
    /// A dependency is down; the request may succeed later.
    ServiceUnavailable,
}

impl ErrorKind {
    /// The upper-case tag used in logs and `Display`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::RateLimit => "RATE_LIMIT",
            Self::Internal => "INTERNAL",
            Self::Database => "DATABASE",
            Self::Cache => "CACHE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// The server is at fault, not the request.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal
                | Self::Database
                | Self::Cache
                | Self::Configuration
                | Self::Serialization
                | Self::ServiceUnavailable
        )
    }

    /// Repeating the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database | Self::Cache | Self::ServiceUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized failure with a human-readable message.
///
/// The message is safe to show to API callers. The optional source keeps
/// the driver-level error for logs only.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category.
    pub kind: ErrorKind,
    /// Caller-facing description.
    pub message: String,
    /// Underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// An error without an underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// An error wrapping a lower-level cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cache, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Shorthand for `self.kind.is_transient()`.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

// The boxed source is not `Clone`; copies keep the kind and message only.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::with_source(ErrorKind::Validation, format!("Invalid UUID: {err}"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::not_found("Client not found");
        assert_eq!(err.to_string(), "NOT_FOUND: Client not found");
    }

    #[test]
    fn test_clone_drops_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::from(json_err);
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Serialization);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_server_error_classification() {
        assert!(ErrorKind::Database.is_server_error());
        assert!(ErrorKind::Internal.is_server_error());
        assert!(!ErrorKind::Validation.is_server_error());
        assert!(!ErrorKind::Conflict.is_server_error());
    }

    #[test]
    fn test_only_infrastructure_failures_are_transient() {
        assert!(AppError::database("connection reset").is_transient());
        assert!(AppError::cache("timeout").is_transient());
        assert!(!AppError::validation("bad ip").is_transient());
        assert!(!AppError::from(serde_json::from_str::<u8>("x").unwrap_err()).is_transient());
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        let value = serde_json::to_value(ErrorKind::RateLimit).unwrap();
        assert_eq!(value, serde_json::json!("RATE_LIMIT"));
        assert_eq!(ErrorKind::RateLimit.to_string(), "RATE_LIMIT");
    }

    #[test]
    fn test_invalid_uuid_is_validation() {
        let err = AppError::from(uuid::Uuid::parse_str("nope").unwrap_err());
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
