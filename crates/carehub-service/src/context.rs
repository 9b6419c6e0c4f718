//! Request context carrying the authenticated caller and client details.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use carehub_core::types::{AuthSession, Role};
use carehub_entity::audit::{ChangeMetadata, ChangeSource};

/// Longest User-Agent carried into audit metadata.
const MAX_USER_AGENT_LEN: usize = 512;

/// Context for the current authenticated request.
///
/// Built by the API layer from the guard's session and passed into service
/// methods so that every operation knows *who* is acting and from *where*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The session the request belongs to.
    pub session_id: Uuid,
    /// The user's role at the time the token was issued.
    pub role: Role,
    /// The user's email.
    pub email: String,
    /// Client IP address, or `"unknown"`.
    pub ip_address: String,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// Correlates every record written while serving this request.
    pub request_id: Uuid,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(session: &AuthSession, ip_address: String, user_agent: Option<String>) -> Self {
        Self {
            user_id: session.user_id,
            session_id: session.session_id,
            role: session.role,
            email: session.email.clone(),
            ip_address,
            user_agent,
            request_id: Uuid::now_v7(),
            request_time: Utc::now(),
        }
    }

    /// Change metadata describing this request.
    ///
    /// An IP that does not parse is recorded as `"unknown"`, and an
    /// over-long User-Agent is truncated, so the result always validates.
    pub fn metadata(&self, source: ChangeSource) -> ChangeMetadata {
        let ip_address = if self.ip_address.parse::<IpAddr>().is_ok() {
            self.ip_address.clone()
        } else {
            "unknown".to_string()
        };

        ChangeMetadata {
            source,
            request_id: Some(self.request_id),
            batch_id: None,
            ip_address: Some(ip_address),
            user_agent: self
                .user_agent
                .as_ref()
                .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            user_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            email: "manager@example.com".into(),
            name: None,
            role: Role::Manager,
        }
    }

    #[test]
    fn test_metadata_always_validates() {
        let ctx = RequestContext::new(
            &session(),
            "proxy-garbage".into(),
            Some("x".repeat(2000)),
        );
        let meta = ctx.metadata(ChangeSource::Api);
        assert_eq!(meta.ip_address.as_deref(), Some("unknown"));
        assert_eq!(meta.user_agent.as_ref().map(|ua| ua.len()), Some(512));
        assert_eq!(meta.request_id, Some(ctx.request_id));
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_metadata_keeps_valid_ip() {
        let ctx = RequestContext::new(&session(), "203.0.113.9".into(), None);
        let meta = ctx.metadata(ChangeSource::Bulk);
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.source, ChangeSource::Bulk);
    }
}
