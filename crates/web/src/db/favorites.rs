//! Favorite repository.

use std::collections::HashSet;

use sqlx::PgPool;

use tokoku_core::{ItemId, UserId};

use super::RepositoryError;
use crate::models::FavoriteToggle;

/// Repository for (user, item) favorites.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Flip the favorite for `(user, item)`.
    ///
    /// Removes the pair when present, otherwise inserts it. The insert ignores
    /// a concurrent duplicate, so the pair stays unique.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a statement fails.
    pub async fn toggle(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<FavoriteToggle, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND item_id = $2")
            .bind(user)
            .bind(item)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let outcome = if removed > 0 {
            FavoriteToggle::Removed
        } else {
            sqlx::query(
                r"
                INSERT INTO favorites (user_id, item_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, item_id) DO NOTHING
                ",
            )
            .bind(user)
            .bind(item)
            .execute(&mut *tx)
            .await?;
            FavoriteToggle::Added
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Whether `user` has favorited `item`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn exists(&self, user: UserId, item: ItemId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND item_id = $2)",
        )
        .bind(user)
        .bind(item)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// The subset of `items` that `user` has favorited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn favorited_among(
        &self,
        user: UserId,
        items: &[ItemId],
    ) -> Result<HashSet<ItemId>, RepositoryError> {
        if items.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i32> = items.iter().map(ItemId::as_i32).collect();
        let rows: Vec<i32> = sqlx::query_scalar(
            "SELECT item_id FROM favorites WHERE user_id = $1 AND item_id = ANY($2)",
        )
        .bind(user)
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(ItemId::new).collect())
    }

    /// Number of users who favorited `item`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn count_for_item(&self, item: ItemId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE item_id = $1")
            .bind(item)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
