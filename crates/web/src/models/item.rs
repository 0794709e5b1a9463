//! Catalog items.

use chrono::{DateTime, NaiveDate, Utc};

use tokoku_core::{CategoryId, ItemId, Price, RecordState};

use super::{CategorySummary, Relation};

/// Relations an item query can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRelation {
    /// The item's category.
    Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub name: String,
    pub unit: String,
    pub price: Price,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub description: Option<String>,
    /// Percentage off, 0-100.
    pub discount: i32,
    pub expired_at: Option<NaiveDate>,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Relation<Option<CategorySummary>>,
}

impl Item {
    /// Price after discount.
    #[must_use]
    pub fn final_price(&self) -> Price {
        self.price.discounted(self.discount)
    }
}

/// An item as shown on the storefront, flagged for the viewing user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub item: Item,
    pub is_favorite: bool,
    pub favorites_count: i64,
}

/// Validated item fields for create and update.
///
/// `image_url` keeps the stored value on update when `None`.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub category_id: CategoryId,
    pub name: String,
    pub unit: String,
    pub price: Price,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub description: Option<String>,
    pub discount: i32,
    pub expired_at: Option<NaiveDate>,
}
