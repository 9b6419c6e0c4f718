//! `AuthContext` extractor: the guard's session and client details as a
//! [`RequestContext`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use carehub_core::error::AppError;
use carehub_core::types::{AuthSession, Role};
use carehub_service::RequestContext;

use crate::error::ApiError;
use crate::middleware::guard::{ClientInfo, UNKNOWN_IP};

/// Authenticated caller, available on every guarded route.
#[derive(Debug, Clone)]
pub struct AuthContext(pub RequestContext);

impl AuthContext {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }

    /// Fail with 403 unless the caller holds at least `role`.
    pub fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.0.role.has_at_least(role) {
            Ok(())
        } else {
            Err(AppError::authorization(format!("{role} access required")).into())
        }
    }
}

impl std::ops::Deref for AuthContext {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the route sits behind `api_guard`.
        let session = parts
            .extensions
            .get::<AuthSession>()
            .ok_or_else(|| AppError::authentication("Unauthorized"))?;

        let (ip, user_agent) = match parts.extensions.get::<ClientInfo>() {
            Some(client) => (client.ip.clone(), client.user_agent.clone()),
            None => (UNKNOWN_IP.to_string(), None),
        };

        Ok(AuthContext(RequestContext::new(session, ip, user_agent)))
    }
}
