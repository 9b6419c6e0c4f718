//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use carehub_core::error::{AppError, ErrorKind};

/// Message used in the `error` field of every 500 response.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body: `{"error": ...}`, plus `message` for server faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// What went wrong.
    pub error: String,
    /// Details of a server fault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorResponse {
    /// A client error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    /// A server error body carrying the fault's message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: INTERNAL_ERROR.to_string(),
            message: Some(message.into()),
        }
    }
}

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        status_for(self.0.kind)
    }
}

/// HTTP status for each error kind.
///
/// Conflicts are reported as 400 so that dependent-record failures read
/// like any other rejected request.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Cache
        | ErrorKind::Configuration
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;

        let body = if err.kind.is_server_error() {
            tracing::error!(kind = %err.kind, error = %err.message, source = ?err.source, "Request failed");
            ApiErrorResponse::internal(err.message)
        } else {
            tracing::debug!(kind = %err.kind, error = %err.message, "Request rejected");
            ApiErrorResponse::new(err.message)
        };

        (status, Json(body)).into_response()
    }
}

/// Flatten `validator` errors into one message naming each bad field.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reason = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .or_else(|| errs.first().map(|e| e.code.to_string()))
                .unwrap_or_else(|| "invalid".to_string());
            format!("{field}: {reason}")
        })
        .collect();
    fields.sort();

    if fields.is_empty() {
        "Invalid request body".to_string()
    } else {
        format!("Validation failed: {}", fields.join("; "))
    }
}

/// Wrap `validator` errors as a validation [`AppError`].
pub fn validation_error(errors: ValidationErrors) -> ApiError {
    ApiError(AppError::validation(validation_message(&errors)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Authentication), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Authorization), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::RateLimit), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status_for(ErrorKind::Database), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_bodies() {
        let client = serde_json::to_value(ApiErrorResponse::new("Client not found")).unwrap();
        assert_eq!(client, serde_json::json!({"error": "Client not found"}));

        let server = serde_json::to_value(ApiErrorResponse::internal("pool timed out")).unwrap();
        assert_eq!(
            server,
            serde_json::json!({"error": "Internal server error", "message": "pool timed out"})
        );
    }
}
