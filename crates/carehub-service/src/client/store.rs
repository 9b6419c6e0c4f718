//! Persistence seam for the client service.

use async_trait::async_trait;
use uuid::Uuid;

use carehub_core::result::AppResult;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_database::repositories::ClientRepository;
use carehub_entity::client::{Client, ClientFilter, ClientPatch, ClientSortField, NewClient};

/// Client rows as the services see them.
#[async_trait]
pub trait ClientStore: Send + Sync + std::fmt::Debug + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>>;

    /// Case-insensitive name lookup.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Client>>;

    async fn list(
        &self,
        filters: &[ClientFilter],
        sort: ClientSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Client>>;

    async fn create(&self, data: &NewClient) -> AppResult<Client>;

    /// Apply a patch, returning the row before and after it.
    async fn update(&self, id: Uuid, patch: &ClientPatch) -> AppResult<Option<(Client, Client)>>;

    async fn delete(&self, id: Uuid) -> AppResult<Option<Client>>;

    /// Staff members still attached to the client.
    async fn count_staff(&self, id: Uuid) -> AppResult<i64>;
}

#[async_trait]
impl ClientStore for ClientRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>> {
        ClientRepository::find_by_id(self, id).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Client>> {
        ClientRepository::find_by_name(self, name).await
    }

    async fn list(
        &self,
        filters: &[ClientFilter],
        sort: ClientSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Client>> {
        ClientRepository::list(self, filters, sort, direction, page).await
    }

    async fn create(&self, data: &NewClient) -> AppResult<Client> {
        ClientRepository::create(self, data).await
    }

    async fn update(&self, id: Uuid, patch: &ClientPatch) -> AppResult<Option<(Client, Client)>> {
        ClientRepository::update(self, id, patch).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Client>> {
        ClientRepository::delete(self, id).await
    }

    async fn count_staff(&self, id: Uuid) -> AppResult<i64> {
        ClientRepository::count_staff(self, id).await
    }
}
