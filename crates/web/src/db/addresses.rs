//! Address repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::{AddressId, ContactId, RecordState, UserId};

use super::listing::{Listing, ListingQuery};
use super::{ListParams, Page, RepositoryError, SoftDelete};
use crate::models::{
    Address, AddressInput, AddressRelation, ContactSummary, Relation, UserSummary,
};

const COLUMNS: &str = "a.id, a.contact_id, a.post_code, a.country, a.province, a.city, \
                       a.street, a.more, a.record_state, a.deleted_at, a.created_at, a.updated_at";

const JOINED_COLUMNS: &str = "a.id, a.contact_id, a.post_code, a.country, a.province, a.city, \
                              a.street, a.more, a.record_state, a.deleted_at, a.created_at, \
                              a.updated_at, c.name AS contact_name, c.user_id AS contact_user_id, \
                              u.username AS user_username, u.email AS user_email";

const FROM: &str = "addresses a \
                    LEFT JOIN contacts c ON c.id = a.contact_id \
                    LEFT JOIN users u ON u.id = c.user_id";

static LISTING: Listing = Listing {
    select: JOINED_COLUMNS,
    from: FROM,
    alias: "a",
    search: &[
        "a.post_code",
        "a.country",
        "a.province",
        "a.city",
        "a.street",
        "c.name",
        "u.username",
        "u.email",
    ],
    sortable: &[
        ("post_code", "a.post_code"),
        ("country", "a.country"),
        ("province", "a.province"),
        ("city", "a.city"),
        ("street", "a.street"),
        ("contact", "c.name"),
        ("created_at", "a.created_at"),
    ],
    tie_break: "a.id ASC",
};

const SOFT_DELETE: SoftDelete = SoftDelete::new("addresses");

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    contact_id: i32,
    post_code: String,
    country: String,
    province: String,
    city: String,
    street: String,
    more: Option<String>,
    record_state: RecordState,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    contact_name: Option<String>,
    #[sqlx(default)]
    contact_user_id: Option<i32>,
    #[sqlx(default)]
    user_username: Option<String>,
    #[sqlx(default)]
    user_email: Option<String>,
}

impl AddressRow {
    fn into_address(self, with: &[AddressRelation]) -> Address {
        let contact_id = ContactId::new(self.contact_id);
        let contact = match (self.contact_name, self.contact_user_id) {
            (Some(name), Some(user_id)) => {
                let user_id = UserId::new(user_id);
                let user = match (self.user_username, self.user_email) {
                    (Some(username), Some(email)) => Some(UserSummary {
                        id: user_id,
                        username,
                        email,
                    }),
                    _ => None,
                };
                Some(ContactSummary {
                    id: contact_id,
                    name,
                    user_id,
                    user,
                })
            }
            _ => None,
        };

        Address {
            id: AddressId::new(self.id),
            contact_id,
            post_code: self.post_code,
            country: self.country,
            province: self.province,
            city: self.city,
            street: self.street,
            more: self.more,
            record_state: self.record_state,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            contact: Relation::load_if(with.contains(&AddressRelation::Contact), || contact),
        }
    }
}

/// Repository for addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of addresses matching the listing parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        with: &[AddressRelation],
    ) -> Result<Page<Address>, RepositoryError> {
        let page = ListingQuery::new(&LISTING, params)
            .fetch::<AddressRow>(self.pool)
            .await?;
        Ok(page.map(|row| row.into_address(with)))
    }

    /// Get an address by id, whatever its record state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(
        &self,
        id: AddressId,
        with: &[AddressRelation],
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "SELECT {JOINED_COLUMNS} FROM {FROM} WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| r.into_address(with)))
    }

    /// Insert a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, input: &AddressInput) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO addresses AS a (contact_id, post_code, country, province, city, street, more) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        ))
        .bind(input.contact_id)
        .bind(&input.post_code)
        .bind(&input.country)
        .bind(&input.province)
        .bind(&input.city)
        .bind(&input.street)
        .bind(&input.more)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_address(&[]))
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist.
    pub async fn update(
        &self,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "UPDATE addresses AS a SET \
                 contact_id = $2, post_code = $3, country = $4, province = $5, city = $6, \
                 street = $7, more = $8, updated_at = now() \
             WHERE a.id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.contact_id)
        .bind(&input.post_code)
        .bind(&input.country)
        .bind(&input.province)
        .bind(&input.city)
        .bind(&input.street)
        .bind(&input.more)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.ok_or(RepositoryError::NotFound)?.into_address(&[]))
    }

    /// Soft-delete an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist.
    pub async fn delete(&self, id: AddressId) -> Result<(), RepositoryError> {
        SOFT_DELETE.delete(self.pool, id.as_i32()).await
    }

    /// Restore a soft-deleted address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist.
    pub async fn restore(&self, id: AddressId) -> Result<(), RepositoryError> {
        SOFT_DELETE.restore(self.pool, id.as_i32()).await
    }

    /// Soft-delete every active address among `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_delete(self.pool, ids).await
    }

    /// Restore every deleted address among `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_restore(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_restore(self.pool, ids).await
    }

    /// (active, deleted) row counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn counts(&self) -> Result<(i64, i64), RepositoryError> {
        SOFT_DELETE.counts(self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_crosses_contact_and_user() {
        let params = ListParams {
            search: Some("bandung".to_string()),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&LISTING, &params).count_query().into_sql();
        assert!(sql.contains("LEFT JOIN contacts c ON c.id = a.contact_id"));
        assert!(sql.contains("a.city ILIKE $4"));
        assert!(sql.contains("c.name ILIKE $6 OR u.username ILIKE $7 OR u.email ILIKE $8)"));
    }

    #[test]
    fn test_explicit_sort_on_contact_name() {
        let params = ListParams {
            sort: Some(("contact".to_string(), tokoku_core::SortOrder::Desc)),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&LISTING, &params).data_query().into_sql();
        assert!(sql.contains("ORDER BY c.name DESC, a.id ASC"));
    }
}
