//! Client repository implementation.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use carehub_core::result::AppResult;
use carehub_core::types::SortDirection;
use carehub_core::types::pagination::{PageRequest, PageResponse};
use carehub_entity::client::{Client, ClientFilter, ClientPatch, ClientSortField, NewClient};

use super::{cleared_or_set, contains_pattern, db_error};

/// Required columns coalesce; optional ones are written whenever their
/// "set" flag is true, which lets a patch clear them to NULL.
const UPDATE_CLIENT: &str = "UPDATE clients SET \
    name = COALESCE($2, name), \
    industry = CASE WHEN $3 THEN $4 ELSE industry END, \
    contact_email = CASE WHEN $5 THEN $6 ELSE contact_email END, \
    contact_phone = CASE WHEN $7 THEN $8 ELSE contact_phone END, \
    is_active = COALESCE($9, is_active), \
    updated_at = NOW() \
    WHERE id = $1 RETURNING *";

/// Repository for client CRUD and query operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Create a new client repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a client by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Client>> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find client by id", e))
    }

    /// Find a client by name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Client>> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find client by name", e))
    }

    /// List clients matching every filter.
    pub async fn list(
        &self,
        filters: &[ClientFilter],
        sort: ClientSortField,
        direction: SortDirection,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Client>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM clients");
        push_filters(&mut count, filters);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count clients", e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM clients");
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

        let clients = select
            .build_query_as::<Client>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list clients", e))?;

        Ok(PageResponse::new(clients, page, total as u64))
    }

    /// Create a new client.
    pub async fn create(&self, data: &NewClient) -> AppResult<Client> {
        sqlx::query_as::<_, Client>(
            "INSERT INTO clients (id, name, industry, contact_email, contact_phone, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.industry)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(data.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create client", e))
    }

    /// Apply a partial update, returning the row before and after.
    ///
    /// The row is locked for the duration so the pair is consistent.
    pub async fn update(&self, id: Uuid, patch: &ClientPatch) -> AppResult<Option<(Client, Client)>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin client update", e))?;

        let before =
            sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to lock client", e))?;

        let Some(before) = before else {
            return Ok(None);
        };

        let after = sqlx::query_as::<_, Client>(UPDATE_CLIENT)
            .bind(id)
            .bind(&patch.name)
            .bind(patch.industry.is_some())
            .bind(cleared_or_set(&patch.industry))
            .bind(patch.contact_email.is_some())
            .bind(cleared_or_set(&patch.contact_email))
            .bind(patch.contact_phone.is_some())
            .bind(cleared_or_set(&patch.contact_phone))
            .bind(patch.is_active)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to update client", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit client update", e))?;

        Ok(Some((before, after)))
    }

    /// Delete a client, returning the removed row.
    pub async fn delete(&self, id: Uuid) -> AppResult<Option<Client>> {
        sqlx::query_as::<_, Client>("DELETE FROM clients WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete client", e))
    }

    /// Count the staff members attached to a client.
    pub async fn count_staff(&self, id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE client_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count client staff", e))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[ClientFilter]) {
    let mut first = true;
    for filter in filters {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
        match filter {
            ClientFilter::Search(term) => {
                let pattern = contains_pattern(term);
                qb.push("(name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR contact_email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            ClientFilter::Active(active) => {
                qb.push("is_active = ").push_bind(*active);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_filter_matches_name_and_email() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM clients");
        push_filters(
            &mut qb,
            &[ClientFilter::Search("acme".into()), ClientFilter::Active(true)],
        );
        assert_eq!(
            qb.sql(),
            "SELECT * FROM clients WHERE (name ILIKE $1 OR contact_email ILIKE $2) AND is_active = $3"
        );
    }
}
