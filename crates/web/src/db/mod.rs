//! Database operations.
//!
//! ## Tables
//!
//! - `users` - Accounts for admins, couriers and storefront clients
//! - `contacts` - Personal details, one or more per user
//! - `addresses` - Postal addresses, one or more per contact
//! - `categories` - Catalog categories
//! - `items` - Catalog items, each in one category
//! - `favorites` - (user, item) pairs, unique per pair
//! - `tower_sessions.session` - Session storage
//!
//! Every entity table carries `record_state` (`active` / `deleted`) with a
//! `deleted_at` timestamp kept consistent by a check constraint.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p tokoku-cli -- migrate
//! ```

pub mod addresses;
pub mod categories;
pub mod contacts;
pub mod favorites;
pub mod items;
pub mod listing;
pub mod soft_delete;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use categories::CategoryRepository;
pub use contacts::ContactRepository;
pub use favorites::FavoriteRepository;
pub use items::ItemRepository;
pub use listing::{ListParams, ListQuery, Page, PageMeta};
pub use soft_delete::SoftDelete;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_string());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
