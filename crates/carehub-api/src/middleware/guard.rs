//! The request guard wrapped around every protected `/api` route.
//!
//! Order per request: resolve the client IP, consult the rate limiter,
//! resolve the session, then run the handler. A refused request gets 429,
//! a missing session 401 and a failing session backend 500. Only the first
//! refusal per key and window is written to the audit log.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error, warn};

use carehub_core::traits::SessionProvider;
use carehub_entity::audit::AuditAction;
use carehub_service::{AuditActionInput, AuditTrail};

use super::rate_limit::{RateDecision, RateLimiter};
use crate::error::ApiErrorResponse;

/// IP recorded when the request carries no `x-forwarded-for` header.
pub const UNKNOWN_IP: &str = "unknown";

/// Where a request came from, as seen by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// First `x-forwarded-for` hop, or `"unknown"`.
    pub ip: String,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Read the client details from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_IP)
            .to_string();

        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Self { ip, user_agent }
    }
}

/// Dependencies of [`api_guard`].
#[derive(Debug, Clone)]
pub struct GuardState {
    /// `None` disables rate limiting.
    limiter: Option<RateLimiter>,
    /// Resolves the caller's session.
    sessions: Arc<dyn SessionProvider>,
    /// Records refused requests when set.
    trail: Option<AuditTrail>,
}

impl GuardState {
    /// Creates guard state without audit recording.
    pub fn new(limiter: Option<RateLimiter>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            limiter,
            sessions,
            trail: None,
        }
    }

    /// Record a RATE_LIMIT action when a key first exceeds its window.
    pub fn with_audit(mut self, trail: AuditTrail) -> Self {
        self.trail = Some(trail);
        self
    }

    fn record_rate_limited(&self, client: &ClientInfo, method: String, path: String) {
        let Some(trail) = self.trail.clone() else {
            return;
        };

        let input = AuditActionInput::new(AuditAction::RateLimit)
            .data(json!({ "method": method, "path": path }))
            .client(client.ip.clone(), client.user_agent.clone());

        tokio::spawn(async move {
            trail.record_action(input).await;
        });
    }
}

/// Rate limit, authenticate, then hand the request to the route.
///
/// On success the [`AuthSession`](carehub_core::types::AuthSession) and
/// [`ClientInfo`] are available as request extensions.
pub async fn api_guard(State(guard): State<GuardState>, mut request: Request, next: Next) -> Response {
    let client = ClientInfo::from_headers(request.headers());

    if let Some(limiter) = &guard.limiter {
        if let RateDecision::Refused { first } = limiter.decide(&client.ip).await {
            if first {
                let method = request.method().to_string();
                let path = request.uri().path().to_string();
                warn!(ip = %client.ip, %method, %path, "Rate limit exceeded");
                guard.record_rate_limited(&client, method, path);
            } else {
                debug!(ip = %client.ip, "Rate limit still exceeded");
            }
            return reject(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
        }
    }

    let session = match guard.sessions.resolve(request.headers()).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            debug!(ip = %client.ip, path = %request.uri().path(), "No session on request");
            return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
        Err(e) => {
            error!(ip = %client.ip, error = %e, "Session resolution failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiErrorResponse::internal(e.message)),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(client);

    next.run(request).await
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(ApiErrorResponse::new(error))).into_response()
}
