//! JWT token validation and blocklist checking.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use carehub_cache::CacheManager;
use carehub_cache::keys;
use carehub_core::config::AuthConfig;
use carehub_core::error::AppError;
use carehub_core::traits::CacheProvider;

use super::claims::Claims;

/// Minimum time a revoked token id stays on the blocklist.
const MIN_BLOCKLIST_TTL: Duration = Duration::from_secs(60);

/// Validates JWT tokens and checks blocklist status.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Cache manager for blocklist lookups.
    cache: Arc<CacheManager>,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig, cache: Arc<CacheManager>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cache,
        }
    }

    /// Decodes and validates a token string.
    ///
    /// Checks the signature, the expiry, and that the token id has not
    /// been revoked.
    pub async fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        self.check_blocklist(&claims).await?;
        Ok(claims)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }

    async fn check_blocklist(&self, claims: &Claims) -> Result<(), AppError> {
        let key = keys::jwt_blocklist(&claims.jti.to_string());
        // A cache outage must not lock everyone out.
        let blocked = match self.cache.exists(&key).await {
            Ok(blocked) => blocked,
            Err(e) => {
                debug!(error = %e, "Blocklist lookup failed, treating token as live");
                false
            }
        };
        if blocked {
            return Err(AppError::authentication("Token has been revoked"));
        }
        Ok(())
    }

    /// Adds a token to the blocklist until it would have expired anyway.
    pub async fn revoke(&self, claims: &Claims) -> Result<(), AppError> {
        let key = keys::jwt_blocklist(&claims.jti.to_string());
        let ttl = Duration::from_secs(claims.remaining_ttl_seconds()).max(MIN_BLOCKLIST_TTL);
        self.cache.set(&key, "revoked", ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use carehub_core::config::CacheConfig;
    use carehub_core::error::ErrorKind;
    use carehub_core::types::Role;
    use chrono::Utc;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            ..AuthConfig::default()
        }
    }

    async fn decoder() -> JwtDecoder {
        let cache = CacheManager::new(&CacheConfig::default()).await.unwrap();
        JwtDecoder::new(&config(), Arc::new(cache))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let encoder = JwtEncoder::new(&config());
        let user_id = Uuid::new_v4();
        let issued = encoder
            .issue(user_id, "ops@example.com", Some("Ops"), Role::Manager)
            .unwrap();

        let claims = decoder().await.decode(&issued.token).await.unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.name.as_deref(), Some("Ops"));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let other = JwtEncoder::new(&AuthConfig {
            jwt_secret: "another-secret".into(),
            ..AuthConfig::default()
        });
        let issued = other
            .issue(Uuid::new_v4(), "x@example.com", None, Role::Viewer)
            .unwrap();

        let err = decoder().await.decode(&issued.token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let encoder = JwtEncoder::new(&config());
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            sid: Uuid::new_v4(),
            email: "x@example.com".into(),
            name: None,
            role: Role::Admin,
            iat: now - 3600,
            exp: now - 600,
            jti: Uuid::new_v4(),
        };
        let token = encoder.encode_claims(&claims).unwrap();

        let err = decoder().await.decode(&token).await.unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() {
        let decoder = decoder().await;
        let issued = JwtEncoder::new(&config())
            .issue(Uuid::new_v4(), "x@example.com", None, Role::Viewer)
            .unwrap();

        let claims = decoder.decode(&issued.token).await.unwrap();
        decoder.revoke(&claims).await.unwrap();

        let err = decoder.decode(&issued.token).await.unwrap_err();
        assert_eq!(err.message, "Token has been revoked");
    }
}
