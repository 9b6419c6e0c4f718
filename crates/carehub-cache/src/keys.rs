//! Every cache key CareHub writes.

use uuid::Uuid;

/// Prefix applied to all CareHub cache keys.
const PREFIX: &str = "carehub";

// ── Client keys ────────────────────────────────────────────

/// Cache key for a client entity by ID.
pub fn client_by_id(client_id: Uuid) -> String {
    format!("{PREFIX}:client:{client_id}")
}

// ── Rate limiting ──────────────────────────────────────────

/// Cache key for the fixed-window counter of a caller.
pub fn rate_limit(key: &str) -> String {
    format!("{PREFIX}:ratelimit:{key}")
}

// ── Auth keys ──────────────────────────────────────────────

/// Cache key for the JWT blocklist (revoked token ids).
pub fn jwt_blocklist(jti: &str) -> String {
    format!("{PREFIX}:jwt:blocked:{jti}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key() {
        let id = Uuid::new_v4();
        assert_eq!(client_by_id(id), format!("carehub:client:{id}"));
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(rate_limit("10.0.0.1"), "carehub:ratelimit:10.0.0.1");
        assert_eq!(rate_limit("unknown"), "carehub:ratelimit:unknown");
    }

    #[test]
    fn test_jwt_blocklist_key() {
        assert_eq!(jwt_blocklist("abc"), "carehub:jwt:blocked:abc");
    }
}
