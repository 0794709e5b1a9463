//! Contact repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use tokoku_core::{ContactId, Gender, RecordState, UserId};

use super::listing::{Listing, ListingQuery};
use super::{ListParams, Page, RepositoryError, SoftDelete};
use crate::models::{Contact, ContactInput, ContactRelation, ContactSummary, Relation, UserSummary};

const COLUMNS: &str = "c.id, c.user_id, c.name, c.phone, c.profile, c.gender, c.birthday, \
                       c.record_state, c.deleted_at, c.created_at, c.updated_at";

const JOINED_COLUMNS: &str = "c.id, c.user_id, c.name, c.phone, c.profile, c.gender, c.birthday, \
                              c.record_state, c.deleted_at, c.created_at, c.updated_at, \
                              u.username AS user_username, u.email AS user_email";

const FROM: &str = "contacts c LEFT JOIN users u ON u.id = c.user_id";

static LISTING: Listing = Listing {
    select: JOINED_COLUMNS,
    from: FROM,
    alias: "c",
    search: &["c.name", "c.phone", "c.gender::text", "u.username", "u.email"],
    sortable: &[
        ("name", "c.name"),
        ("phone", "c.phone"),
        ("gender", "c.gender"),
        ("birthday", "c.birthday"),
        ("user", "u.username"),
        ("created_at", "c.created_at"),
    ],
    tie_break: "c.user_id ASC, c.id ASC",
};

const SOFT_DELETE: SoftDelete = SoftDelete::new("contacts");

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i32,
    user_id: i32,
    name: String,
    phone: String,
    profile: Option<String>,
    gender: Gender,
    birthday: Option<NaiveDate>,
    record_state: RecordState,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    user_username: Option<String>,
    #[sqlx(default)]
    user_email: Option<String>,
}

impl ContactRow {
    fn into_contact(self, with: &[ContactRelation]) -> Contact {
        let user_id = UserId::new(self.user_id);
        let user = match (self.user_username, self.user_email) {
            (Some(username), Some(email)) => Some(UserSummary {
                id: user_id,
                username,
                email,
            }),
            _ => None,
        };

        Contact {
            id: ContactId::new(self.id),
            user_id,
            name: self.name,
            phone: self.phone,
            profile: self.profile,
            gender: self.gender,
            birthday: self.birthday,
            record_state: self.record_state,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user: Relation::load_if(with.contains(&ContactRelation::User), || user),
        }
    }
}

/// Repository for contacts.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of contacts matching the listing parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        with: &[ContactRelation],
    ) -> Result<Page<Contact>, RepositoryError> {
        let page = ListingQuery::new(&LISTING, params)
            .filter_eq("c.gender", params.gender.map(Gender::as_str))
            .fetch::<ContactRow>(self.pool)
            .await?;
        Ok(page.map(|row| row.into_contact(with)))
    }

    /// Get a contact by id, whatever its record state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ContactId,
        with: &[ContactRelation],
    ) -> Result<Option<Contact>, RepositoryError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "SELECT {JOINED_COLUMNS} FROM {FROM} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| r.into_contact(with)))
    }

    /// Active contacts for select inputs, with their user's name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn options(&self) -> Result<Vec<ContactSummary>, RepositoryError> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "SELECT {JOINED_COLUMNS} FROM {FROM} \
             WHERE c.record_state = 'active' ORDER BY c.name, c.id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let contact = row.into_contact(&[ContactRelation::User]);
                ContactSummary {
                    id: contact.id,
                    name: contact.name,
                    user_id: contact.user_id,
                    user: contact.user.as_loaded().cloned().flatten(),
                }
            })
            .collect())
    }

    /// Insert a new contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, input: &ContactInput) -> Result<Contact, RepositoryError> {
        let row: ContactRow = sqlx::query_as(&format!(
            "INSERT INTO contacts AS c (user_id, name, phone, profile, gender, birthday) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        ))
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.profile)
        .bind(input.gender)
        .bind(input.birthday)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_contact(&[]))
    }

    /// Replace a contact's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact does not exist.
    pub async fn update(
        &self,
        id: ContactId,
        input: &ContactInput,
    ) -> Result<Contact, RepositoryError> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "UPDATE contacts AS c SET \
                 user_id = $2, name = $3, phone = $4, profile = $5, gender = $6, birthday = $7, \
                 updated_at = now() \
             WHERE c.id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.profile)
        .bind(input.gender)
        .bind(input.birthday)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.ok_or(RepositoryError::NotFound)?.into_contact(&[]))
    }

    /// Whether an active contact has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn is_active(&self, id: ContactId) -> Result<bool, RepositoryError> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = $1 AND record_state = 'active')",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(active)
    }

    /// Soft-delete a contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact does not exist.
    pub async fn delete(&self, id: ContactId) -> Result<(), RepositoryError> {
        SOFT_DELETE.delete(self.pool, id.as_i32()).await
    }

    /// Restore a soft-deleted contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact does not exist.
    pub async fn restore(&self, id: ContactId) -> Result<(), RepositoryError> {
        SOFT_DELETE.restore(self.pool, id.as_i32()).await
    }

    /// Soft-delete every active contact among `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_delete(self.pool, ids).await
    }

    /// Restore every deleted contact among `ids`.
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
    fn test_search_reaches_owning_user() {
        let params = ListParams {
            search: Some("gmail".to_string()),
            gender: Some(Gender::Man),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&LISTING, &params)
            .filter_eq("c.gender", params.gender.map(Gender::as_str))
            .data_query()
            .into_sql();
        assert!(sql.contains("LEFT JOIN users u ON u.id = c.user_id"));
        assert!(sql.contains("c.gender::text = $1"));
        assert!(sql.contains("u.username ILIKE $5 OR u.email ILIKE $6)"));
        assert!(sql.contains("ORDER BY c.created_at DESC, c.user_id ASC, c.id ASC"));
    }

    #[test]
    fn test_user_relation_only_when_requested() {
        let row = || ContactRow {
            id: 1,
            user_id: 7,
            name: "Dewi".to_string(),
            phone: "0812".to_string(),
            profile: None,
            gender: Gender::Woman,
            birthday: None,
            record_state: RecordState::Active,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_username: Some("dewi".to_string()),
            user_email: Some("dewi@example.com".to_string()),
        };

        assert!(row().into_contact(&[]).user.is_not_loaded());

        let contact = row().into_contact(&[ContactRelation::User]);
        let user = contact.user.as_loaded().cloned().flatten();
        assert_eq!(user.map(|u| u.id), Some(UserId::new(7)));
    }
}
