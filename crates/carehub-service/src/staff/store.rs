//! Persistence seam for the staff service.

use async_trait::async_trait;
use uuid::Uuid;

use carehub_core::result::AppResult;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_database::repositories::StaffRepository;
use carehub_entity::staff::{NewStaff, Staff, StaffFilter, StaffPatch, StaffSortField, StaffUpdate};

/// Staff rows as the services see them.
///
/// The bulk methods are all-or-nothing: either every item is written or
/// none is.
#[async_trait]
pub trait StaffStore: Send + Sync + std::fmt::Debug + 'static {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Staff>>;

    async fn list(
        &self,
        filters: &[StaffFilter],
        sort: StaffSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Staff>>;

    async fn create(&self, data: &NewStaff) -> AppResult<Staff>;

    /// Apply a patch, returning the row before and after it.
    async fn update(&self, id: Uuid, patch: &StaffPatch) -> AppResult<Option<(Staff, Staff)>>;

    async fn delete(&self, id: Uuid) -> AppResult<Option<Staff>>;

    async fn bulk_create(&self, items: &[NewStaff]) -> AppResult<Vec<Staff>>;

    /// Before/after pairs in input order.
    async fn bulk_update(&self, items: &[StaffUpdate]) -> AppResult<Vec<(Staff, Staff)>>;

    async fn bulk_delete(&self, ids: &[Uuid]) -> AppResult<Vec<Staff>>;
}

#[async_trait]
impl StaffStore for StaffRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Staff>> {
        StaffRepository::find_by_id(self, id).await
    }

    async fn list(
        &self,
        filters: &[StaffFilter],
        sort: StaffSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Staff>> {
        StaffRepository::list(self, filters, sort, direction, page).await
    }

    async fn create(&self, data: &NewStaff) -> AppResult<Staff> {
        StaffRepository::create(self, data).await
    }

    async fn update(&self, id: Uuid, patch: &StaffPatch) -> AppResult<Option<(Staff, Staff)>> {
        StaffRepository::update(self, id, patch).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Staff>> {
        StaffRepository::delete(self, id).await
    }

    async fn bulk_create(&self, items: &[NewStaff]) -> AppResult<Vec<Staff>> {
        StaffRepository::bulk_create(self, items).await
    }

    async fn bulk_update(&self, items: &[StaffUpdate]) -> AppResult<Vec<(Staff, Staff)>> {
        StaffRepository::bulk_update(self, items).await
    }

    async fn bulk_delete(&self, ids: &[Uuid]) -> AppResult<Vec<Staff>> {
        StaffRepository::bulk_delete(self, ids).await
    }
}
