//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::{Email, RecordState, UserId, UserRole, UserStatus};

use super::listing::{Listing, ListingQuery};
use super::{ListParams, Page, RepositoryError, SoftDelete};
use crate::models::{NewUser, User, UserChanges, UserSummary};

const COLUMNS: &str = "u.id, u.google_id, u.username, u.email, u.avatar, u.role, u.status, \
                       u.email_verified_at, u.record_state, u.deleted_at, u.created_at, u.updated_at";

static LISTING: Listing = Listing {
    select: COLUMNS,
    from: "users u",
    alias: "u",
    search: &["u.username", "u.email", "u.role::text", "u.status::text"],
    sortable: &[
        ("username", "u.username"),
        ("email", "u.email"),
        ("role", "u.role"),
        ("status", "u.status"),
        ("created_at", "u.created_at"),
        ("updated_at", "u.updated_at"),
    ],
    tie_break: "u.id ASC",
};

const SOFT_DELETE: SoftDelete = SoftDelete::new("users");

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    google_id: Option<String>,
    username: String,
    email: String,
    avatar: Option<String>,
    role: UserRole,
    status: UserStatus,
    email_verified_at: Option<DateTime<Utc>>,
    record_state: RecordState,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            google_id: row.google_id,
            username: row.username,
            email,
            avatar: row.avatar,
            role: row.role,
            status: row.status,
            record_state: row.record_state,
            email_verified_at: row.email_verified_at,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of users matching the listing parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(&self, params: &ListParams) -> Result<Page<User>, RepositoryError> {
        let page = ListingQuery::new(&LISTING, params)
            .filter_eq("u.role", params.role.map(UserRole::as_str))
            .filter_eq("u.status", params.status.map(UserStatus::as_str))
            .fetch::<UserRow>(self.pool)
            .await?;
        page.try_map(User::try_from)
    }

    /// Get a user by id, whatever its record state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM users u WHERE u.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash for sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS}, u.password_hash FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Active users for select inputs, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn options(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        let rows: Vec<(i32, String, String)> = sqlx::query_as(
            r"
            SELECT id, username, email
            FROM users
            WHERE record_state = 'active'
            ORDER BY username
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, email)| UserSummary {
                id: UserId::new(id),
                username,
                email,
            })
            .collect())
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username, email or Google id
    /// is already taken.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users AS u (google_id, username, email, password_hash, avatar, role, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        ))
        .bind(&user.google_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.role)
        .bind(user.status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username or email already exists"))?;

        row.try_into()
    }

    /// Apply changes to an existing user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist, or
    /// `RepositoryError::Conflict` on a uniqueness violation.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users AS u SET \
                 google_id = $2, username = $3, email = $4, \
                 password_hash = COALESCE($5, u.password_hash), \
                 avatar = COALESCE($6, u.avatar), \
                 role = $7, status = $8, updated_at = now() \
             WHERE u.id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.google_id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.avatar)
        .bind(changes.role)
        .bind(changes.status)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username or email already exists"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Whether `username` belongs to a user other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn username_taken(
        &self,
        username: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("username", username, except).await
    }

    /// Whether `email` belongs to a user other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn email_taken(
        &self,
        email: &Email,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("email", email.as_str(), except).await
    }

    /// Whether `google_id` belongs to a user other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn google_id_taken(
        &self,
        google_id: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        self.taken("google_id", google_id, except).await
    }

    async fn taken(
        &self,
        column: &'static str,
        value: &str,
        except: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {column} = $1 AND ($2::int IS NULL OR id <> $2))"
        ))
        .bind(value)
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Whether an active user has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn is_active(&self, id: UserId) -> Result<bool, RepositoryError> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND record_state = 'active')",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(active)
    }

    /// Soft-delete a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        SOFT_DELETE.delete(self.pool, id.as_i32()).await
    }

    /// Restore a soft-deleted user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn restore(&self, id: UserId) -> Result<(), RepositoryError> {
        SOFT_DELETE.restore(self.pool, id.as_i32()).await
    }

    /// Soft-delete every active user among `ids`, returning how many moved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_delete(self.pool, ids).await
    }

    /// Restore every deleted user among `ids`, returning how many moved.
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
    fn test_listing_filters_role_and_status() {
        let params = ListParams {
            role: Some(UserRole::Admin),
            status: Some(UserStatus::Active),
            search: Some("rina".to_string()),
            ..ListParams::default()
        };
        let query = ListingQuery::new(&LISTING, &params)
            .filter_eq("u.role", params.role.map(UserRole::as_str))
            .filter_eq("u.status", params.status.map(UserStatus::as_str));
        let sql = query.count_query().into_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM users u WHERE u.record_state = 'active' \
             AND u.role::text = $1 AND u.status::text = $2 \
             AND (u.username ILIKE $3 OR u.email ILIKE $4 OR u.role::text ILIKE $5 OR u.status::text ILIKE $6)"
        );
    }

    #[test]
    fn test_default_order_is_newest_then_id() {
        let sql = ListingQuery::new(&LISTING, &ListParams::default())
            .data_query()
            .into_sql();
        assert!(sql.ends_with("ORDER BY u.created_at DESC, u.id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_password_hash_is_not_listed() {
        assert!(!LISTING.select.contains("password"));
    }
}
