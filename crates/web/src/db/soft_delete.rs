//! Soft-delete and restore transitions shared by every entity table.

use sqlx::PgPool;

use super::RepositoryError;

/// Soft-delete operations for one table.
///
/// Rows move between `active` and `deleted`; `deleted_at` is stamped on the
/// way in and cleared on the way out. Single-row transitions are idempotent
/// and fail only when the id does not exist. Bulk transitions affect exactly
/// the rows in the opposite state and report how many moved.
#[derive(Debug, Clone, Copy)]
pub struct SoftDelete {
    table: &'static str,
}

impl SoftDelete {
    #[must_use]
    pub const fn new(table: &'static str) -> Self {
        Self { table }
    }

    /// Soft-delete one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this id.
    pub async fn delete(&self, pool: &PgPool, id: i32) -> Result<(), RepositoryError> {
        let moved = self.bulk_delete(pool, &[id]).await?;
        if moved == 0 && !self.exists(pool, id).await? {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Restore one row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this id.
    pub async fn restore(&self, pool: &PgPool, id: i32) -> Result<(), RepositoryError> {
        let moved = self.bulk_restore(pool, &[id]).await?;
        if moved == 0 && !self.exists(pool, id).await? {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Soft-delete every active row among `ids`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn bulk_delete(&self, pool: &PgPool, ids: &[i32]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(&format!(
            "UPDATE {} SET record_state = 'deleted', deleted_at = now(), updated_at = now() \
             WHERE id = ANY($1) AND record_state = 'active'",
            self.table
        ))
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Restore every deleted row among `ids`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn bulk_restore(&self, pool: &PgPool, ids: &[i32]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(&format!(
            "UPDATE {} SET record_state = 'active', deleted_at = NULL, updated_at = now() \
             WHERE id = ANY($1) AND record_state = 'deleted'",
            self.table
        ))
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn exists(&self, pool: &PgPool, id: i32) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            self.table
        ))
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Count rows per state, as (active, deleted).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self, pool: &PgPool) -> Result<(i64, i64), RepositoryError> {
        let counts: (i64, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FILTER (WHERE record_state = 'active'), \
                    COUNT(*) FILTER (WHERE record_state = 'deleted') \
             FROM {}",
            self.table
        ))
        .fetch_one(pool)
        .await?;
        Ok(counts)
    }
}
