//! Category serialization.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tokoku_core::{CategoryId, RecordState};

use super::{ItemResource, storage_url};
use crate::models::{Category, CategorySummary, Relation};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResource {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub image_src: Option<String>,
    pub description: Option<String>,
    pub items_count: i64,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Relation::is_not_loaded")]
    pub items: Relation<Vec<ItemResource>>,
}

impl CategoryResource {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.record_state.is_deleted()
    }

    /// Loaded items, or an empty slice.
    #[must_use]
    pub fn loaded_items(&self) -> &[ItemResource] {
        self.items.as_loaded().map_or(&[], Vec::as_slice)
    }
}

impl From<&Category> for CategoryResource {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            image_url: category.image_url.clone(),
            image_src: category.image_url.as_deref().map(storage_url),
            description: category.description.clone(),
            items_count: category.items_count,
            record_state: category.record_state,
            deleted_at: category.deleted_at,
            created_at: category.created_at,
            updated_at: category.updated_at,
            items: category
                .items
                .clone()
                .map(|items| items.iter().map(ItemResource::from).collect()),
        }
    }
}

/// The category embedded in items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummaryResource {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<&CategorySummary> for CategorySummaryResource {
    fn from(category: &CategorySummary) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(items: Relation<Vec<crate::models::Item>>) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(4),
            name: "Sayur & Buah".to_string(),
            slug: "sayur-buah".to_string(),
            image_url: Some("img/categories/s.jpg".to_string()),
            description: None,
            items_count: 0,
            record_state: RecordState::Active,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            items,
        }
    }

    #[test]
    fn test_items_relation() {
        let json = serde_json::to_value(CategoryResource::from(&category(Relation::NotLoaded))).unwrap();
        assert!(json.get("items").is_none());
        assert_eq!(json["image_src"], "/storage/img/categories/s.jpg");

        let resource = CategoryResource::from(&category(Relation::Loaded(Vec::new())));
        assert!(resource.loaded_items().is_empty());
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
    }
}
