//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Duration;

use carehub_auth::{JwtDecoder, JwtSessionProvider};
use carehub_cache::CacheManager;
use carehub_core::config::AppConfig;
use carehub_database::DatabasePool;
use carehub_database::repositories::{AuditRepository, ClientRepository, StaffRepository};
use carehub_service::{
    AuditQueryService, AuditTrail, ChangeLogger, ClientService, StaffService,
};

use crate::middleware::{GuardState, RateLimiter};

/// Application state containing all shared dependencies.
///
/// Built once at startup and passed to every handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool
    pub db: DatabasePool,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// Request guard dependencies
    pub guard: GuardState,
    /// Client service
    pub client_service: Arc<ClientService>,
    /// Staff service
    pub staff_service: Arc<StaffService>,
    /// Audit read side
    pub audit_query: Arc<AuditQueryService>,
}

impl AppState {
    /// Wire repositories, services and the guard over shared handles.
    pub fn build(config: AppConfig, db: DatabasePool, cache: Arc<CacheManager>) -> Self {
        let pool = db.pool().clone();

        let client_repo = Arc::new(ClientRepository::new(pool.clone()));
        let staff_repo = Arc::new(StaffRepository::new(pool.clone()));
        let audit_repo = Arc::new(AuditRepository::new(pool));

        let trail = AuditTrail::new(ChangeLogger::new(audit_repo.clone()), &config.audit);

        let client_service = Arc::new(ClientService::new(
            client_repo.clone(),
            cache.clone(),
            trail.clone(),
            Duration::from_secs(config.cache.client_ttl_seconds),
        ));
        let staff_service = Arc::new(StaffService::new(
            staff_repo,
            client_repo,
            trail.clone(),
            config.staff.max_bulk_size,
        ));
        let audit_query = Arc::new(AuditQueryService::new(audit_repo));

        let limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::new(cache.clone(), &config.rate_limit));
        let sessions = Arc::new(JwtSessionProvider::new(JwtDecoder::new(
            &config.auth,
            cache.clone(),
        )));
        let guard = GuardState::new(limiter, sessions).with_audit(trail);

        Self {
            config: Arc::new(config),
            db,
            cache,
            guard,
            client_service,
            staff_service,
            audit_query,
        }
    }
}
