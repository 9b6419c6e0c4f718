//! Drives the request guard through a real axum router.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::get;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use uuid::Uuid;

use carehub_api::error::ApiResult;
use carehub_api::extractors::AuthContext;
use carehub_api::middleware::panic::handle_panic;
use carehub_api::middleware::{GuardState, RateLimiter, api_guard};
use carehub_auth::{JwtDecoder, JwtEncoder, JwtSessionProvider};
use carehub_cache::CacheManager;
use carehub_cache::memory::MemoryCacheProvider;
use carehub_core::config::{AuditConfig, AuthConfig};
use carehub_core::config::cache::MemoryCacheConfig;
use carehub_core::error::AppError;
use carehub_core::result::AppResult;
use carehub_core::traits::{CacheProvider, SessionProvider};
use carehub_core::types::{AuthSession, Role};
use carehub_entity::audit::{AuditAction, AuditLog, EntityChange, NewAuditLog, NewEntityChange};
use carehub_service::{AuditStore, AuditTrail, ChangeLogger};

/// Hands out a fixed session and counts how often it was asked.
#[derive(Debug)]
struct StubSessions {
    session: Option<AuthSession>,
    calls: AtomicUsize,
}

impl StubSessions {
    fn signed_in(role: Role) -> Arc<Self> {
        Arc::new(Self {
            session: Some(AuthSession {
                user_id: Uuid::new_v4(),
                session_id: Uuid::new_v4(),
                email: "manager@example.com".to_string(),
                name: Some("Morgan".to_string()),
                role,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            session: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SessionProvider for StubSessions {
    async fn resolve(&self, _headers: &HeaderMap) -> AppResult<Option<AuthSession>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.session.clone())
    }
}

#[derive(Debug)]
struct BrokenSessions;

#[async_trait]
impl SessionProvider for BrokenSessions {
    async fn resolve(&self, _headers: &HeaderMap) -> AppResult<Option<AuthSession>> {
        Err(AppError::cache("blocklist unreachable"))
    }
}

#[derive(Debug)]
struct UnreachableCache;

#[async_trait]
impl CacheProvider for UnreachableCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Err(AppError::cache("connection refused"))
    }
    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
        Err(AppError::cache("connection refused"))
    }
    async fn delete(&self, _key: &str) -> AppResult<()> {
        Err(AppError::cache("connection refused"))
    }
    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Err(AppError::cache("connection refused"))
    }
    async fn health_check(&self) -> AppResult<bool> {
        Ok(false)
    }
}

/// Keeps audit log rows in memory.
#[derive(Debug, Default)]
struct RecordingAuditStore {
    logs: Mutex<Vec<AuditLog>>,
}

#[async_trait]
impl AuditStore for RecordingAuditStore {
    async fn insert_entity_change(&self, _change: &NewEntityChange) -> AppResult<EntityChange> {
        Err(AppError::internal("the guard records no entity changes"))
    }

    async fn insert_audit_log(&self, entry: &NewAuditLog) -> AppResult<AuditLog> {
        let row = AuditLog {
            id: Uuid::now_v7(),
            action: entry.action,
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
            data: entry.data.clone(),
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            user_id: entry.user_id,
            created_at: Utc::now(),
        };
        self.logs.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

fn memory_cache() -> Arc<CacheManager> {
    let provider = MemoryCacheProvider::new(&MemoryCacheConfig::default());
    Arc::new(CacheManager::from_provider(Arc::new(provider)))
}

fn limiter(max_requests: u32) -> RateLimiter {
    RateLimiter::with_limits(memory_cache(), max_requests, Duration::from_secs(60))
}

async fn explode() -> StatusCode {
    panic!("staff import exploded")
}

async fn database_down() -> ApiResult<StatusCode> {
    Err(AppError::database("connection pool exhausted").into())
}

async fn client_has_staff() -> ApiResult<StatusCode> {
    Err(AppError::conflict("Cannot delete client with existing staff members").into())
}

async fn managers_only(auth: AuthContext) -> ApiResult<StatusCode> {
    auth.require(Role::Manager)?;
    Ok(StatusCode::NO_CONTENT)
}

/// A guarded router whose `/api/echo` handler counts its calls and echoes
/// the caller's IP.
fn app(guard: GuardState, hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/api/echo",
            get(move |auth: AuthContext| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::CREATED, auth.ip_address.clone())
                }
            }),
        )
        .route("/api/explode", get(explode))
        .route("/api/database-down", get(database_down))
        .route("/api/client-has-staff", get(client_has_staff))
        .route("/api/managers-only", get(managers_only))
        .route_layer(from_fn_with_state(guard, api_guard))
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn get_request(path: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(ip) = forwarded_for {
        builder = builder.header("x-forwarded-for", ip);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_rate_limited_request_never_reaches_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let sessions = StubSessions::signed_in(Role::Manager);
    let app = app(GuardState::new(Some(limiter(1)), sessions.clone()), hits.clone());

    let first = app
        .clone()
        .oneshot(get_request("/api/echo", Some("198.51.100.4")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(get_request("/api/echo", Some("198.51.100.4")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await, json!({"error": "Too many requests"}));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    // Refused before the session was looked at.
    assert_eq!(sessions.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limit_is_keyed_by_forwarded_ip() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = app(
        GuardState::new(Some(limiter(1)), StubSessions::signed_in(Role::Viewer)),
        hits.clone(),
    );

    for ip in ["198.51.100.4", "198.51.100.5, 10.0.0.1", "198.51.100.6"] {
        let response = app
            .clone()
            .oneshot(get_request("/api/echo", Some(ip)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_missing_session_never_reaches_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = app(
        GuardState::new(Some(limiter(100)), StubSessions::anonymous()),
        hits.clone(),
    );

    let response = app.oneshot(get_request("/api/echo", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_session_backend_failure_is_server_error() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = app(GuardState::new(None, Arc::new(BrokenSessions)), hits.clone());

    let response = app.oneshot(get_request("/api/echo", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Internal server error", "message": "blocklist unreachable"})
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_flood_from_one_ip_is_audited_once_per_window() {
    let hits = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(RecordingAuditStore::default());
    let config = AuditConfig {
        enabled: true,
        max_attempts: 1,
        retry_backoff_ms: 1,
    };
    let trail = AuditTrail::new(ChangeLogger::new(store.clone()), &config);
    let guard = GuardState::new(Some(limiter(1)), StubSessions::signed_in(Role::Viewer))
        .with_audit(trail);
    let app = app(guard, hits.clone());

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let response = app
            .clone()
            .oneshot(get_request("/api/echo", Some("198.51.100.9")))
            .await
            .unwrap();
        statuses.push(response.status());
    }
    let other = app
        .clone()
        .oneshot(get_request("/api/echo", Some("198.51.100.10")))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::CREATED);

    assert_eq!(statuses[0], StatusCode::CREATED);
    assert!(statuses[1..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Audit records are written by spawned tasks.
    for _ in 0..50 {
        if !store.logs.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let logs = store.logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, AuditAction::RateLimit);
    assert_eq!(logs[0].ip_address.as_deref(), Some("198.51.100.9"));
    assert_eq!(
        logs[0].data,
        Some(json!({"method": "GET", "path": "/api/echo"}))
    );
}

#[tokio::test]
async fn test_handler_response_passes_through_with_forwarded_ip() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = app(
        GuardState::new(Some(limiter(100)), StubSessions::signed_in(Role::Viewer)),
        hits.clone(),
    );

    let response = app
        .clone()
        .oneshot(get_request("/api/echo", Some(" 203.0.113.7 , 10.0.0.1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "203.0.113.7");

    let response = app.oneshot(get_request("/api/echo", None)).await.unwrap();
    assert_eq!(body_text(response).await, "unknown");
}

#[tokio::test]
async fn test_panic_in_handler_becomes_500_with_message() {
    let app = app(
        GuardState::new(Some(limiter(100)), StubSessions::signed_in(Role::Admin)),
        Arc::new(AtomicUsize::new(0)),
    );

    let response = app.oneshot(get_request("/api/explode", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Internal server error", "message": "staff import exploded"})
    );
}

#[tokio::test]
async fn test_handler_errors_use_the_envelope() {
    let app = app(
        GuardState::new(None, StubSessions::signed_in(Role::Viewer)),
        Arc::new(AtomicUsize::new(0)),
    );

    let response = app
        .clone()
        .oneshot(get_request("/api/database-down", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Internal server error", "message": "connection pool exhausted"})
    );

    let response = app
        .clone()
        .oneshot(get_request("/api/client-has-staff", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Cannot delete client with existing staff members"})
    );

    let response = app
        .oneshot(get_request("/api/managers-only", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unreachable_rate_limit_store_fails_open() {
    let hits = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(CacheManager::from_provider(Arc::new(UnreachableCache)));
    let limiter = RateLimiter::with_limits(cache, 1, Duration::from_secs(60));
    let app = app(
        GuardState::new(Some(limiter), StubSessions::signed_in(Role::Viewer)),
        hits.clone(),
    );

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_request("/api/echo", Some("198.51.100.4")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_bearer_token_session_reaches_handler() {
    let config = AuthConfig {
        jwt_secret: "guard-test-secret".to_string(),
        ..AuthConfig::default()
    };
    let cache = memory_cache();
    let issued = JwtEncoder::new(&config)
        .issue(Uuid::new_v4(), "admin@example.com", None, Role::Admin)
        .unwrap();
    let sessions = Arc::new(JwtSessionProvider::new(JwtDecoder::new(&config, cache)));
    let app = app(GuardState::new(None, sessions), Arc::new(AtomicUsize::new(0)));

    let authorized = Request::builder()
        .uri("/api/managers-only")
        .header("authorization", format!("Bearer {}", issued.token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(authorized).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let forged = Request::builder()
        .uri("/api/managers-only")
        .header("authorization", "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(forged).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
