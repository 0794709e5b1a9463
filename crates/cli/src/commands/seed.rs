//! Seed the catalog from a YAML file.
//!
//! The file lists categories, each with its items:
//!
//! ```yaml
//! categories:
//!   - name: Sayuran
//!     description: Sayur segar setiap pagi.
//!     items:
//!       - name: Bayam
//!         unit: ikat
//!         price: "3500"
//!         stock: 120
//! ```
//!
//! Categories are matched by slug. One that already exists (deleted ones
//! included) is skipped together with its items, so the command can be
//! re-run safely.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use tokoku_core::{CategoryId, Price, slugify};
use tokoku_web::db::{CategoryRepository, ItemRepository, RepositoryError};
use tokoku_web::models::{CategoryInput, ItemInput};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<SeedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedItem {
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub discount: i32,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    pub description: Option<String>,
    pub expired_at: Option<NaiveDate>,
}

const fn available_by_default() -> bool {
    true
}

impl SeedFile {
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

/// Check every entry, returning one message per problem.
#[must_use]
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut slugs = HashSet::new();

    for (i, category) in file.categories.iter().enumerate() {
        let at = format!("categories[{i}]");
        let name = category.name.trim();
        if name.is_empty() {
            errors.push(format!("{at}: name is required"));
        } else if name.chars().count() > 100 {
            errors.push(format!("{at}: name may not be greater than 100 characters"));
        } else if slugify(name).is_empty() {
            errors.push(format!("{at}: name must contain letters or digits"));
        } else if !slugs.insert(slugify(name)) {
            errors.push(format!("{at}: duplicate category \"{name}\""));
        }

        for (j, item) in category.items.iter().enumerate() {
            let at = format!("{at}.items[{j}]");
            let name = item.name.trim();
            if name.is_empty() {
                errors.push(format!("{at}: name is required"));
            } else if name.chars().count() > 150 {
                errors.push(format!("{at}: name may not be greater than 150 characters"));
            }
            let unit = item.unit.trim();
            if unit.is_empty() {
                errors.push(format!("{at}: unit is required"));
            } else if unit.chars().count() > 20 {
                errors.push(format!("{at}: unit may not be greater than 20 characters"));
            }
            if item.price.is_sign_negative() {
                errors.push(format!("{at}: price must be at least 0"));
            }
            if item.stock < 0 {
                errors.push(format!("{at}: stock must be at least 0"));
            }
            if !(0..=100).contains(&item.discount) {
                errors.push(format!("{at}: discount must be between 0 and 100"));
            }
        }
    }

    errors
}

/// Counts reported after a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories_inserted: usize,
    pub categories_skipped: usize,
    pub items_inserted: usize,
}

/// Seed the catalog from `path`. With `dry_run` the file is only parsed and
/// validated.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or is invalid, or a
/// database operation fails.
pub async fn run(path: &Path, dry_run: bool) -> Result<(), SeedError> {
    if !path.exists() {
        return Err(SeedError::FileNotFound(path.display().to_string()));
    }

    info!(path = %path.display(), "Loading catalog");
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(
        categories = file.categories.len(),
        items = file.item_count(),
        "Parsed catalog"
    );

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    if dry_run {
        info!("Dry run: catalog is valid, nothing written");
        return Ok(());
    }

    let pool = connect().await?;
    let summary = seed(&pool, file).await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", summary.categories_inserted);
    info!("  Categories skipped (already exist): {}", summary.categories_skipped);
    info!("  Items inserted: {}", summary.items_inserted);
    Ok(())
}

async fn seed(pool: &sqlx::PgPool, file: SeedFile) -> Result<SeedSummary, SeedError> {
    let categories = CategoryRepository::new(pool);
    let items = ItemRepository::new(pool);
    let mut summary = SeedSummary::default();

    for category in file.categories {
        let name = category.name.trim().to_owned();
        let slug = slugify(&name);
        if categories.slug_taken(&slug, None).await? {
            info!(%slug, "Category exists, skipping");
            summary.categories_skipped += 1;
            continue;
        }

        let created = categories
            .create(&CategoryInput {
                name,
                slug,
                description: category.description,
                image_url: None,
            })
            .await?;
        summary.categories_inserted += 1;

        for item in category.items {
            items.create(&item_input(created.id, item)).await?;
            summary.items_inserted += 1;
        }
    }

    Ok(summary)
}

fn item_input(category_id: CategoryId, item: SeedItem) -> ItemInput {
    ItemInput {
        category_id,
        name: item.name.trim().to_owned(),
        unit: item.unit.trim().to_owned(),
        price: Price::new(item.price),
        stock: item.stock,
        image_url: None,
        is_available: item.is_available,
        description: item.description,
        discount: item.discount,
        expired_at: item.expired_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let file: SeedFile = serde_yaml::from_str(include_str!("../../seeds/catalog.yaml")).unwrap();
        assert!(!file.categories.is_empty());
        assert!(validate(&file).is_empty(), "{:?}", validate(&file));
    }

    #[test]
    fn test_item_defaults() {
        let file: SeedFile = serde_yaml::from_str(
            r#"
categories:
  - name: Buah
    items:
      - name: Apel Malang
        unit: kg
        price: "28000"
"#,
        )
        .unwrap();
        let item = file.categories.first().unwrap().items.first().unwrap();
        assert!(item.is_available);
        assert_eq!(item.stock, 0);
        assert_eq!(item.discount, 0);
        assert_eq!(item.price, Decimal::new(28000, 0));
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let file: SeedFile = serde_yaml::from_str(
            r#"
categories:
  - name: Buah
    items:
      - name: ""
        unit: kg
        price: "-1"
        discount: 120
  - name: " buah "
"#,
        )
        .unwrap();
        let errors = validate(&file);
        assert_eq!(
            errors,
            vec![
                "categories[0].items[0]: name is required",
                "categories[0].items[0]: price must be at least 0",
                "categories[0].items[0]: discount must be between 0 and 100",
                "categories[1]: duplicate category \"buah\"",
            ]
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<SeedFile, _> =
            serde_yaml::from_str("categories:\n  - name: Buah\n    colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_item_input_trims() {
        let item = SeedItem {
            name: " Bayam ".to_string(),
            unit: " ikat ".to_string(),
            price: Decimal::new(3500, 0),
            stock: 5,
            discount: 10,
            is_available: true,
            description: None,
            expired_at: None,
        };
        let input = item_input(CategoryId::new(3), item);
        assert_eq!(input.name, "Bayam");
        assert_eq!(input.unit, "ikat");
        assert_eq!(input.category_id, CategoryId::new(3));
        assert_eq!(input.price.amount(), Decimal::new(3500, 0));
    }
}
