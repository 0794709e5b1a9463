//! Category repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tokoku_core::{CategoryId, RecordState};

use super::listing::{Listing, ListingQuery};
use super::{ItemRepository, ListParams, Page, RepositoryError, SoftDelete};
use crate::models::{Category, CategoryInput, CategoryRelation, CategorySummary, Relation};

const COLUMNS: &str = "cat.id, cat.name, cat.slug, cat.image_url, cat.description, \
                       (SELECT COUNT(*) FROM items i \
                        WHERE i.category_id = cat.id AND i.record_state = 'active') AS items_count, \
                       cat.record_state, cat.deleted_at, cat.created_at, cat.updated_at";

static LISTING: Listing = Listing {
    select: COLUMNS,
    from: "categories cat",
    alias: "cat",
    search: &["cat.name", "cat.slug", "cat.description"],
    sortable: &[
        ("name", "cat.name"),
        ("slug", "cat.slug"),
        ("items_count", "items_count"),
        ("created_at", "cat.created_at"),
    ],
    tie_break: "cat.id ASC",
};

const SOFT_DELETE: SoftDelete = SoftDelete::new("categories");

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    image_url: Option<String>,
    description: Option<String>,
    items_count: i64,
    record_state: RecordState,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            image_url: row.image_url,
            description: row.description,
            items_count: row.items_count,
            record_state: row.record_state,
            deleted_at: row.deleted_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: Relation::NotLoaded,
        }
    }
}

/// Repository for categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of categories matching the listing parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        with: &[CategoryRelation],
    ) -> Result<Page<Category>, RepositoryError> {
        let page = ListingQuery::new(&LISTING, params)
            .fetch::<CategoryRow>(self.pool)
            .await?
            .map(Category::from);

        if !with.contains(&CategoryRelation::Items) {
            return Ok(page);
        }

        let ids: Vec<CategoryId> = page.data.iter().map(|c| c.id).collect();
        let mut grouped: HashMap<CategoryId, Vec<_>> = HashMap::new();
        for item in ItemRepository::new(self.pool).active_in_categories(&ids).await? {
            grouped.entry(item.category_id).or_default().push(item);
        }

        Ok(page.map(|mut category| {
            category.items = Relation::Loaded(grouped.remove(&category.id).unwrap_or_default());
            category
        }))
    }

    /// Get a category by id, whatever its record state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn get_by_id(
        &self,
        id: CategoryId,
        with: &[CategoryRelation],
    ) -> Result<Option<Category>, RepositoryError> {
        let row: Option<CategoryRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM categories cat WHERE cat.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(mut category) = row.map(Category::from) else {
            return Ok(None);
        };
        if with.contains(&CategoryRelation::Items) {
            let items = ItemRepository::new(self.pool)
                .active_in_categories(&[category.id])
                .await?;
            category.items = Relation::Loaded(items);
        }
        Ok(Some(category))
    }

    /// Active categories for select inputs, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn options(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows: Vec<(i32, String, String)> = sqlx::query_as(
            r"
            SELECT id, name, slug
            FROM categories
            WHERE record_state = 'active'
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, slug)| CategorySummary {
                id: CategoryId::new(id),
                name,
                slug,
            })
            .collect())
    }

    /// Insert a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO categories (name, slug, description, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category slug already exists"))?;

        self.get_by_id(CategoryId::new(id), &[])
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a category's fields. A `None` image keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let updated: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE categories SET
                name = $2, slug = $3, description = $4,
                image_url = COALESCE($5, image_url),
                updated_at = now()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.image_url)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category slug already exists"))?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id, &[])
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Whether `slug` belongs to a category other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn slug_taken(
        &self,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(except)
        .fetch_one(self.pool)
        .await?;
        Ok(taken)
    }

    /// Whether an active category has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn is_active(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND record_state = 'active')",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(active)
    }

    /// Soft-delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        SOFT_DELETE.delete(self.pool, id.as_i32()).await
    }

    /// Restore a soft-deleted category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn restore(&self, id: CategoryId) -> Result<(), RepositoryError> {
        SOFT_DELETE.restore(self.pool, id.as_i32()).await
    }

    /// Soft-delete every active category among `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_delete(self.pool, ids).await
    }

    /// Restore every deleted category among `ids`.
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
    fn test_items_count_is_sortable() {
        let params = ListParams {
            sort: Some(("items_count".to_string(), tokoku_core::SortOrder::Desc)),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&LISTING, &params).data_query().into_sql();
        assert!(sql.contains("ORDER BY items_count DESC, cat.id ASC"));
    }

    #[test]
    fn test_count_query_skips_select_list() {
        let sql = ListingQuery::new(&LISTING, &ListParams::default())
            .count_query()
            .into_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM categories cat WHERE cat.record_state = 'active'"
        );
    }
}
