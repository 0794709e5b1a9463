//! Catalog categories.

use chrono::{DateTime, Utc};

use tokoku_core::{CategoryId, RecordState};

use super::{Item, Relation};

/// Relations a category query can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRelation {
    /// Active items in the category.
    Items,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Number of active items.
    pub items_count: i64,
    pub record_state: RecordState,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Relation<Vec<Item>>,
}

/// The identifying slice of a category embedded in items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Validated category fields for create and update.
///
/// The slug is derived from the name. `image_url` keeps the stored value on
/// update when `None`.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
