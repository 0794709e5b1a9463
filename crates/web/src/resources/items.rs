//! Item serialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use tokoku_core::{CategoryId, ItemId, Price, RecordState};

use super::{CategorySummaryResource, storage_url};
use crate::models::{CatalogItem, Item, Relation};

#[derive(Debug, Clone, Serialize)]
pub struct ItemResource {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub name: String,
    pub unit: String,
    pub price: Price,
    pub final_price: Price,
    pub price_display: String,
    pub final_price_display: String,
    pub stock: i32,
    pub image_url: Option<String>,
    pub image_src: Option<String>,
    pub is_available: bool,
    pub description: Option<String>,
    pub discount: i32,
    pub expired_at: Option<NaiveDate>,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Relation::is_not_loaded")]
    pub category: Relation<Option<CategorySummaryResource>>,
}

impl ItemResource {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.record_state.is_deleted()
    }

    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discount > 0
    }

    /// Name of the loaded category, if any.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_loaded()
            .and_then(Option::as_ref)
            .map(|c| c.name.as_str())
    }
}

impl From<&Item> for ItemResource {
    fn from(item: &Item) -> Self {
        let final_price = item.final_price();
        Self {
            id: item.id,
            category_id: item.category_id,
            name: item.name.clone(),
            unit: item.unit.clone(),
            price: item.price,
            final_price,
            price_display: item.price.display(),
            final_price_display: final_price.display(),
            stock: item.stock,
            image_url: item.image_url.clone(),
            image_src: item.image_url.as_deref().map(storage_url),
            is_available: item.is_available,
            description: item.description.clone(),
            discount: item.discount,
            expired_at: item.expired_at,
            record_state: item.record_state,
            deleted_at: item.deleted_at,
            created_at: item.created_at,
            updated_at: item.updated_at,
            category: item
                .category
                .clone()
                .map(|category| category.as_ref().map(CategorySummaryResource::from)),
        }
    }
}

/// A storefront item with the viewer's favorite flag.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogItemResource {
    #[serde(flatten)]
    pub item: ItemResource,
    pub is_favorite: bool,
    pub favorites_count: i64,
}

impl From<&CatalogItem> for CatalogItemResource {
    fn from(entry: &CatalogItem) -> Self {
        Self {
            item: ItemResource::from(&entry.item),
            is_favorite: entry.is_favorite,
            favorites_count: entry.favorites_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::CategorySummary;

    fn item() -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::new(11),
            category_id: CategoryId::new(2),
            name: "Minyak Goreng".to_string(),
            unit: "liter".to_string(),
            price: Price::new(Decimal::new(20_000, 0)),
            stock: 12,
            image_url: None,
            is_available: true,
            description: Some("**Jernih**".to_string()),
            discount: 25,
            expired_at: NaiveDate::from_ymd_opt(2027, 1, 31),
            record_state: RecordState::Active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            category: Relation::Loaded(Some(CategorySummary {
                id: CategoryId::new(2),
                name: "Sembako".to_string(),
                slug: "sembako".to_string(),
            })),
        }
    }

    #[test]
    fn test_prices_and_category() {
        let resource = ItemResource::from(&item());
        assert_eq!(resource.price_display, "Rp 20.000");
        assert_eq!(resource.final_price_display, "Rp 15.000");
        assert!(resource.has_discount());
        assert_eq!(resource.category_name(), Some("Sembako"));

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["category"]["slug"], "sembako");
        assert_eq!(json["expired_at"], "2027-01-31");
        assert!(json["image_src"].is_null());
    }

    #[test]
    fn test_catalog_item_is_flat() {
        let entry = CatalogItem {
            item: item(),
            is_favorite: true,
            favorites_count: 3,
        };
        let json = serde_json::to_value(CatalogItemResource::from(&entry)).unwrap();
        assert_eq!(json["id"], 11);
        assert_eq!(json["is_favorite"], true);
        assert_eq!(json["favorites_count"], 3);
    }
}
