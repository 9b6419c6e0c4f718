//! Staff repository implementation.
//!
//! Single-row writes and bulk writes share the same statements; the bulk
//! variants run them inside one transaction so a batch lands whole or not
//! at all.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use carehub_core::error::AppError;
use carehub_core::result::AppResult;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_entity::staff::{NewStaff, Staff, StaffFilter, StaffPatch, StaffSortField, StaffUpdate};

use super::{cleared_or_set, contains_pattern, db_error};

const UPDATE_STAFF: &str = "UPDATE staff SET \
    first_name = COALESCE($2, first_name), \
    last_name = COALESCE($3, last_name), \
    email = COALESCE($4, email), \
    job_title = CASE WHEN $5 THEN $6 ELSE job_title END, \
    department = CASE WHEN $7 THEN $8 ELSE department END, \
    is_active = COALESCE($9, is_active), \
    updated_at = NOW() \
    WHERE id = $1 RETURNING *";

/// Repository for staff CRUD, listing and bulk operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    /// Create a new staff repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a staff member by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find staff by id", e))
    }

    /// List staff matching every filter.
    pub async fn list(
        &self,
        filters: &[StaffFilter],
        sort: StaffSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Staff>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM staff");
        push_filters(&mut count, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count staff", e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM staff");
        push_filters(&mut select, filters);
        select
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                sort.column(),
                direction.as_sql()
            ))
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let staff = select
            .build_query_as::<Staff>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list staff", e))?;

        Ok(PageResponse::new(staff, page, total as u64))
    }

    /// Create one staff member.
    pub async fn create(&self, data: &NewStaff) -> AppResult<Staff> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        insert(&mut *conn, data).await
    }

    /// Apply a partial update, returning the row before and after.
    pub async fn update(&self, id: Uuid, patch: &StaffPatch) -> AppResult<Option<(Staff, Staff)>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin staff update", e))?;

        let Some(pair) = update_locked(&mut *tx, id, patch).await? else {
            return Ok(None);
        };

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit staff update", e))?;
        Ok(Some(pair))
    }

    /// Delete a staff member, returning the removed row.
    pub async fn delete(&self, id: Uuid) -> AppResult<Option<Staff>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error("Failed to acquire connection", e))?;
        remove(&mut *conn, id).await
    }

    /// Create every item in one transaction.
    pub async fn bulk_create(&self, items: &[NewStaff]) -> AppResult<Vec<Staff>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin bulk create", e))?;

        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(insert(&mut *tx, item).await?);
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit bulk create", e))?;
        debug!(count = created.len(), "Bulk created staff");
        Ok(created)
    }

    /// Update every item in one transaction, returning before/after pairs.
    ///
    /// A missing id rolls back the whole batch with a not-found error.
    pub async fn bulk_update(&self, items: &[StaffUpdate]) -> AppResult<Vec<(Staff, Staff)>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin bulk update", e))?;

        let mut updated = Vec::with_capacity(items.len());
        for item in items {
            let pair = update_locked(&mut *tx, item.id, &item.patch)
                .await?
                .ok_or_else(|| missing(item.id))?;
            updated.push(pair);
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit bulk update", e))?;
        debug!(count = updated.len(), "Bulk updated staff");
        Ok(updated)
    }

    /// Delete every id in one transaction, returning the removed rows.
    ///
    /// A missing id rolls back the whole batch with a not-found error.
    pub async fn bulk_delete(&self, ids: &[Uuid]) -> AppResult<Vec<Staff>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin bulk delete", e))?;

        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            let row = remove(&mut *tx, *id).await?.ok_or_else(|| missing(*id))?;
            deleted.push(row);
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit bulk delete", e))?;
        debug!(count = deleted.len(), "Bulk deleted staff");
        Ok(deleted)
    }
}

fn missing(id: Uuid) -> AppError {
    AppError::not_found(format!("Staff member {id} not found"))
}

async fn insert(conn: &mut PgConnection, data: &NewStaff) -> AppResult<Staff> {
    sqlx::query_as::<_, Staff>(
        "INSERT INTO staff \
         (id, client_id, first_name, last_name, email, job_title, department, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(data.client_id)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.email)
    .bind(&data.job_title)
    .bind(&data.department)
    .bind(data.is_active)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to create staff member", e))
}

async fn update_locked(
    conn: &mut PgConnection,
    id: Uuid,
    patch: &StaffPatch,
) -> AppResult<Option<(Staff, Staff)>> {
    let before = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to lock staff member", e))?;

    let Some(before) = before else {
        return Ok(None);
    };

    let after = sqlx::query_as::<_, Staff>(UPDATE_STAFF)
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.email)
        .bind(patch.job_title.is_some())
        .bind(cleared_or_set(&patch.job_title))
        .bind(patch.department.is_some())
        .bind(cleared_or_set(&patch.department))
        .bind(patch.is_active)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to update staff member", e))?;

    Ok(Some((before, after)))
}

async fn remove(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Staff>> {
    sqlx::query_as::<_, Staff>("DELETE FROM staff WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete staff member", e))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[StaffFilter]) {
    let mut first = true;
    for filter in filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
        match filter {
            StaffFilter::Client(client_id) => {
                qb.push("client_id = ").push_bind(*client_id);
            }
            StaffFilter::Search(term) => {
                let pattern = contains_pattern(term);
                qb.push("(first_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR last_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            StaffFilter::Department(department) => {
                qb.push("department = ").push_bind(department.clone());
            }
            StaffFilter::Active(active) => {
                qb.push("is_active = ").push_bind(*active);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_compose_with_and() {
        let client_id = Uuid::new_v4();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM staff");
        push_filters(
            &mut qb,
            &[
                StaffFilter::Client(client_id),
                StaffFilter::Department("Finance".into()),
            ],
        );
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM staff WHERE client_id = $1 AND department = $2"
        );
    }

    #[test]
    fn test_missing_is_not_found() {
        let id = Uuid::new_v4();
        let err = missing(id);
        assert_eq!(err.kind, carehub_core::error::ErrorKind::NotFound);
        assert!(err.message.contains(&id.to_string()));
    }
}
