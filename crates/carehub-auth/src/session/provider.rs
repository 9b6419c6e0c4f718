//! `SessionProvider` backed by bearer JWTs.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::debug;

use carehub_core::result::AppResult;
use carehub_core::traits::SessionProvider;
use carehub_core::types::AuthSession;

use crate::jwt::JwtDecoder;

/// Resolves sessions from `Authorization: Bearer <jwt>` headers.
///
/// Anything short of a valid, unrevoked token resolves to `None`; the guard
/// turns that into a 401.
#[derive(Debug, Clone)]
pub struct JwtSessionProvider {
    decoder: JwtDecoder,
}

impl JwtSessionProvider {
    /// Creates a provider around a configured decoder.
    pub fn new(decoder: JwtDecoder) -> Self {
        Self { decoder }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> AppResult<Option<AuthSession>> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };

        match self.decoder.decode(token).await {
            Ok(claims) => Ok(Some(claims.into_session())),
            Err(e) => {
                debug!(reason = %e.message, "Rejected bearer token");
                Ok(None)
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
