//! Item repository, including the storefront catalog queries.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use tokoku_core::{CategoryId, ItemId, Price, RecordState, UserId};

use super::listing::{Listing, ListingQuery};
use super::{FavoriteRepository, ListParams, Page, RepositoryError, SoftDelete};
use crate::models::{CatalogItem, CategorySummary, Item, ItemInput, ItemRelation, Relation};

const COLUMNS: &str = "i.id, i.category_id, i.name, i.unit, i.price, i.stock, i.image_url, \
                       i.is_available, i.description, i.discount, i.expired_at, \
                       i.record_state, i.deleted_at, i.created_at, i.updated_at";

const JOINED_COLUMNS: &str = "i.id, i.category_id, i.name, i.unit, i.price, i.stock, i.image_url, \
                              i.is_available, i.description, i.discount, i.expired_at, \
                              i.record_state, i.deleted_at, i.created_at, i.updated_at, \
                              cat.name AS category_name, cat.slug AS category_slug";

const FROM: &str = "items i LEFT JOIN categories cat ON cat.id = i.category_id";

static LISTING: Listing = Listing {
    select: JOINED_COLUMNS,
    from: FROM,
    alias: "i",
    search: &["i.name", "i.unit", "i.description", "cat.name"],
    sortable: &[
        ("name", "i.name"),
        ("price", "i.price"),
        ("stock", "i.stock"),
        ("discount", "i.discount"),
        ("is_available", "i.is_available"),
        ("expired_at", "i.expired_at"),
        ("category", "cat.name"),
        ("created_at", "i.created_at"),
    ],
    tie_break: "i.id ASC",
};

/// Storefront search over name and description, newest first.
static CATALOG: Listing = Listing {
    select: "i.id, i.category_id, i.name, i.unit, i.price, i.stock, i.image_url, \
             i.is_available, i.description, i.discount, i.expired_at, \
             i.record_state, i.deleted_at, i.created_at, i.updated_at, \
             cat.name AS category_name, cat.slug AS category_slug, \
             (SELECT COUNT(*) FROM favorites f WHERE f.item_id = i.id) AS favorites_count",
    from: FROM,
    alias: "i",
    search: &["i.name", "i.description"],
    sortable: &[],
    tie_break: "i.id ASC",
};

const SOFT_DELETE: SoftDelete = SoftDelete::new("items");

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i32,
    category_id: i32,
    name: String,
    unit: String,
    price: Price,
    stock: i32,
    image_url: Option<String>,
    is_available: bool,
    description: Option<String>,
    discount: i32,
    expired_at: Option<NaiveDate>,
    record_state: RecordState,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    category_name: Option<String>,
    #[sqlx(default)]
    category_slug: Option<String>,
    #[sqlx(default)]
    favorites_count: i64,
}

impl ItemRow {
    fn into_item(self, with: &[ItemRelation]) -> Item {
        let category_id = CategoryId::new(self.category_id);
        let category = match (self.category_name, self.category_slug) {
            (Some(name), Some(slug)) => Some(CategorySummary {
                id: category_id,
                name,
                slug,
            }),
            _ => None,
        };

        Item {
            id: ItemId::new(self.id),
            category_id,
            name: self.name,
            unit: self.unit,
            price: self.price,
            stock: self.stock,
            image_url: self.image_url,
            is_available: self.is_available,
            description: self.description,
            discount: self.discount,
            expired_at: self.expired_at,
            record_state: self.record_state,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            category: Relation::load_if(with.contains(&ItemRelation::Category), || category),
        }
    }
}

/// Repository for items.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of items matching the listing parameters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn list(
        &self,
        params: &ListParams,
        with: &[ItemRelation],
    ) -> Result<Page<Item>, RepositoryError> {
        let page = ListingQuery::new(&LISTING, params)
            .filter_id("i.category_id", params.category_id.map(|id| id.as_i32()))
            .fetch::<ItemRow>(self.pool)
            .await?;
        Ok(page.map(|row| row.into_item(with)))
    }

    /// Get an item by id, whatever its record state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ItemId,
        with: &[ItemRelation],
    ) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {JOINED_COLUMNS} FROM {FROM} WHERE i.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| r.into_item(with)))
    }

    /// Active items belonging to any of `categories`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn active_in_categories(
        &self,
        categories: &[CategoryId],
    ) -> Result<Vec<Item>, RepositoryError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = categories.iter().map(CategoryId::as_i32).collect();
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM items i \
             WHERE i.category_id = ANY($1) AND i.record_state = 'active' \
             ORDER BY i.created_at DESC, i.id ASC"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.into_item(&[])).collect())
    }

    /// Storefront search over available items, flagged for `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn catalog(
        &self,
        search: Option<&str>,
        page: u32,
        per_page: u32,
        viewer: Option<UserId>,
    ) -> Result<Page<CatalogItem>, RepositoryError> {
        let params = ListParams {
            search: search.map(str::to_string),
            page,
            per_page,
            ..ListParams::default()
        };
        let page = ListingQuery::new(&CATALOG, &params)
            .filter_eq("i.is_available", Some("true"))
            .fetch::<ItemRow>(self.pool)
            .await?;
        let meta = page.meta;
        let data = self.flag_favorites(page.data, viewer).await?;
        Ok(Page { data, meta })
    }

    /// Items with at least one favorite, most favorited first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn popular(
        &self,
        limit: u32,
        viewer: Option<UserId>,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {JOINED_COLUMNS}, COUNT(f.id) AS favorites_count \
             FROM {FROM} \
             JOIN favorites f ON f.item_id = i.id \
             WHERE i.record_state = 'active' AND i.is_available \
             GROUP BY i.id, cat.id \
             ORDER BY favorites_count DESC, i.id ASC \
             LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        self.flag_favorites(rows, viewer).await
    }

    async fn flag_favorites(
        &self,
        rows: Vec<ItemRow>,
        viewer: Option<UserId>,
    ) -> Result<Vec<CatalogItem>, RepositoryError> {
        let favorites: HashSet<ItemId> = match viewer {
            Some(user) => {
                let ids: Vec<ItemId> = rows.iter().map(|r| ItemId::new(r.id)).collect();
                FavoriteRepository::new(self.pool)
                    .favorited_among(user, &ids)
                    .await?
            }
            None => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let favorites_count = row.favorites_count;
                let item = row.into_item(&[ItemRelation::Category]);
                CatalogItem {
                    is_favorite: favorites.contains(&item.id),
                    favorites_count,
                    item,
                }
            })
            .collect())
    }

    /// Insert a new item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    pub async fn create(&self, input: &ItemInput) -> Result<Item, RepositoryError> {
        let row: ItemRow = sqlx::query_as(&format!(
            "INSERT INTO items AS i \
                 (category_id, name, unit, price, stock, image_url, is_available, description, \
                  discount, expired_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        ))
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(input.is_available)
        .bind(&input.description)
        .bind(input.discount)
        .bind(input.expired_at)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_item(&[]))
    }

    /// Replace an item's fields. A `None` image keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn update(&self, id: ItemId, input: &ItemInput) -> Result<Item, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "UPDATE items AS i SET \
                 category_id = $2, name = $3, unit = $4, price = $5, stock = $6, \
                 image_url = COALESCE($7, i.image_url), is_available = $8, description = $9, \
                 discount = $10, expired_at = $11, updated_at = now() \
             WHERE i.id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.unit)
        .bind(input.price)
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(input.is_available)
        .bind(&input.description)
        .bind(input.discount)
        .bind(input.expired_at)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.ok_or(RepositoryError::NotFound)?.into_item(&[]))
    }

    /// Whether an active item has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn is_active(&self, id: ItemId) -> Result<bool, RepositoryError> {
        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = $1 AND record_state = 'active')",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(active)
    }

    /// Soft-delete an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        SOFT_DELETE.delete(self.pool, id.as_i32()).await
    }

    /// Restore a soft-deleted item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    pub async fn restore(&self, id: ItemId) -> Result<(), RepositoryError> {
        SOFT_DELETE.restore(self.pool, id.as_i32()).await
    }

    /// Soft-delete every active item among `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the update fails.
    pub async fn bulk_delete(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        SOFT_DELETE.bulk_delete(self.pool, ids).await
    }

    /// Restore every deleted item among `ids`.
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
    fn test_category_filter_and_search() {
        let params = ListParams {
            search: Some("beras".to_string()),
            category_id: Some(CategoryId::new(2)),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&LISTING, &params)
            .filter_id("i.category_id", params.category_id.map(|id| id.as_i32()))
            .count_query()
            .into_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM items i LEFT JOIN categories cat ON cat.id = i.category_id \
             WHERE i.record_state = 'active' AND i.category_id = $1 \
             AND (i.name ILIKE $2 OR i.unit ILIKE $3 OR i.description ILIKE $4 OR cat.name ILIKE $5)"
        );
    }

    #[test]
    fn test_catalog_ignores_sort_requests() {
        let params = ListParams {
            sort: Some(("price".to_string(), tokoku_core::SortOrder::Asc)),
            ..ListParams::default()
        };
        let sql = ListingQuery::new(&CATALOG, &params).data_query().into_sql();
        assert!(sql.contains("ORDER BY i.created_at DESC, i.id ASC"));
    }
}
