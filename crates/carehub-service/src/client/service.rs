//! Client CRUD with a read-through cache and change auditing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use carehub_cache::CacheManager;
use carehub_cache::keys;
use carehub_core::error::{AppError, ErrorKind};
use carehub_core::traits::CacheProvider;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_entity::audit::ChangeSource;
use carehub_entity::client::{CLIENT_ENTITY, Client, ClientFilter, ClientPatch, ClientSortField, NewClient};

use super::store::ClientStore;
use crate::audit::{AuditTrail, EntityChangeInput};
use crate::context::RequestContext;

/// Message returned when a client still has staff attached.
pub const CLIENT_HAS_STAFF: &str = "Cannot delete client with existing staff members";

/// Manages employer organizations.
#[derive(Debug, Clone)]
pub struct ClientService {
    /// Client rows.
    client_repo: Arc<dyn ClientStore>,
    /// Cache for single-client lookups.
    cache: Arc<CacheManager>,
    /// Audit side channel.
    trail: AuditTrail,
    /// TTL of cached clients.
    cache_ttl: Duration,
}

impl ClientService {
    /// Creates a new client service.
    pub fn new(
        client_repo: Arc<dyn ClientStore>,
        cache: Arc<CacheManager>,
        trail: AuditTrail,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client_repo,
            cache,
            trail,
            cache_ttl,
        }
    }

    /// Lists clients.
    pub async fn list(
        &self,
        filters: &[ClientFilter],
        sort: ClientSortField,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<PageResponse<Client>, AppError> {
        self.client_repo.list(filters, sort, direction, &page).await
    }

    /// Gets one client, serving from cache when possible.
    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        let key = keys::client_by_id(id);

        match self.cache.get_json::<Client>(&key).await {
            Ok(Some(client)) => return Ok(client),
            Ok(None) => {}
            Err(e) => warn!(client_id = %id, error = %e, "Client cache read failed"),
        }

        let client = self
            .client_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if let Err(e) = self.cache.set_json(&key, &client, self.cache_ttl).await {
            warn!(client_id = %id, error = %e, "Client cache write failed");
        }

        Ok(client)
    }

    /// Creates a client.
    pub async fn create(&self, ctx: &RequestContext, data: NewClient) -> Result<Client, AppError> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Client name cannot be empty"));
        }
        self.ensure_name_free(name, None).await?;

        let client = self
            .client_repo
            .create(&NewClient {
                name: name.to_string(),
                ..data
            })
            .await?;

        info!(client_id = %client.id, name = %client.name, user_id = %ctx.user_id, "Client created");

        let input = EntityChangeInput::created(CLIENT_ENTITY, client.id, &client).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(client)
    }

    /// Applies a partial update to a client.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        patch: ClientPatch,
    ) -> Result<Client, AppError> {
        if patch.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Client name cannot be empty"));
            }
            self.ensure_name_free(name.trim(), Some(id)).await?;
        }

        let (before, after) = self
            .client_repo
            .update(id, &patch)
            .await?
            .ok_or_else(|| not_found(id))?;

        self.invalidate(id).await;
        info!(client_id = %id, user_id = %ctx.user_id, "Client updated");

        let input = EntityChangeInput::updated(CLIENT_ENTITY, id, &before, &patch).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(after)
    }

    /// Deletes a client that has no staff.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<Client, AppError> {
        if self.client_repo.find_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }
        if self.client_repo.count_staff(id).await? > 0 {
            return Err(AppError::conflict(CLIENT_HAS_STAFF));
        }

        let removed = self
            .client_repo
            .delete(id)
            .await
            .map_err(|e| {
                // Staff added between the check and the delete trip the FK.
                if e.kind == ErrorKind::Conflict {
                    AppError::conflict(CLIENT_HAS_STAFF)
                } else {
                    e
                }
            })?
            .ok_or_else(|| not_found(id))?;

        self.invalidate(id).await;
        info!(client_id = %id, user_id = %ctx.user_id, "Client deleted");

        let input = EntityChangeInput::deleted(CLIENT_ENTITY, id, &removed).map(|input| {
            input
                .by(ctx.user_id)
                .with_metadata(ctx.metadata(ChangeSource::Api))
        });
        self.trail.record_built(input).await;

        Ok(removed)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), AppError> {
        match self.client_repo.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::conflict(format!(
                "A client named '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    async fn invalidate(&self, id: Uuid) {
        if let Err(e) = self.cache.delete(&keys::client_by_id(id)).await {
            warn!(client_id = %id, error = %e, "Client cache invalidation failed");
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Client {id} not found"))
}
