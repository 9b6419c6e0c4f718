//! Session resolution trait used by the request guard.

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::result::AppResult;
use crate::types::session::AuthSession;

/// Resolves the authenticated session for an incoming request.
///
/// Implementations return `Ok(None)` when the request carries no usable
/// credentials; `Err` is reserved for backend failures.
#[async_trait]
pub trait SessionProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve the session from the request headers.
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<AuthSession>>;
}
