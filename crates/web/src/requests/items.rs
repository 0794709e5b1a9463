//! Item validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use tokoku_core::{CategoryId, Price};

use super::{FormData, Rules, Validated};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::ItemInput;
use crate::services::UploadedFile;

/// Validated item fields.
#[derive(Debug, Clone)]
pub struct ItemForm {
    pub category_id: CategoryId,
    pub name: String,
    pub unit: String,
    pub price: Price,
    pub stock: i32,
    pub is_available: bool,
    pub description: Option<String>,
    pub discount: i32,
    pub expired_at: Option<NaiveDate>,
    pub image: Option<UploadedFile>,
}

impl ItemForm {
    /// Combine with the stored path of the uploaded image, if one was sent.
    #[must_use]
    pub fn into_input(self, image_url: Option<String>) -> ItemInput {
        ItemInput {
            category_id: self.category_id,
            name: self.name,
            unit: self.unit,
            price: self.price,
            stock: self.stock,
            image_url,
            is_available: self.is_available,
            description: self.description,
            discount: self.discount,
            expired_at: self.expired_at,
        }
    }
}

/// Validate item fields. The category must exist and not be deleted.
///
/// # Errors
///
/// Returns `RepositoryError` if the category lookup fails.
pub async fn validate_item(
    form: &FormData,
    categories: &CategoryRepository<'_>,
) -> Result<Validated<ItemForm>, RepositoryError> {
    let mut rules = Rules::new(form);

    let category_id: Option<i32> = rules.parse_required(
        "category_id",
        "The category field is required.",
        "The selected category is invalid.",
    );
    let category_id = category_id.map(CategoryId::new);

    let name = rules.required("name", "The name field is required.");
    rules.max_chars(
        "name",
        name.as_deref(),
        150,
        "The name may not be greater than 150 characters.",
    );

    let unit = rules.required("unit", "The unit field is required.");
    rules.max_chars(
        "unit",
        unit.as_deref(),
        20,
        "The unit may not be greater than 20 characters.",
    );

    let price: Option<Decimal> = rules.parse_required(
        "price",
        "The price field is required.",
        "The price must be a number.",
    );
    let price = price.and_then(|amount| {
        if amount.is_sign_negative() {
            rules.fail("price", "The price must be at least 0.");
            None
        } else {
            Some(Price::new(amount))
        }
    });

    let stock: Option<i32> = rules.parse_required(
        "stock",
        "The stock field is required.",
        "The stock must be an integer.",
    );
    let stock = stock.and_then(|stock| {
        if stock < 0 {
            rules.fail("stock", "The stock must be at least 0.");
            None
        } else {
            Some(stock)
        }
    });

    let is_available = form.checked("is_available");
    let description = rules.optional("description");

    let discount: Option<i32> = rules.parse("discount", "The discount must be an integer.");
    if discount.is_some_and(|d| !(0..=100).contains(&d)) {
        rules.fail("discount", "The discount must be between 0 and 100.");
    }
    let discount = discount.unwrap_or(0);

    let expired_at: Option<NaiveDate> =
        rules.parse("expired_at", "The expired at is not a valid date.");

    let image = rules.image(
        "image_url",
        5120,
        "The image must be a file of type: jpg, jpeg, png.",
        "The image may not be larger than 5MB.",
    );

    if let Some(id) = category_id
        && !categories.is_active(id).await?
    {
        rules.fail("category_id", "The selected category is invalid.");
    }

    Ok(rules.finish(|| {
        Some(ItemForm {
            category_id: category_id?,
            name: name?,
            unit: unit?,
            price: price?,
            stock: stock?,
            is_available,
            description,
            discount,
            expired_at,
            image,
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::form;
    use super::*;

    fn lazy_pool() -> sqlx::PgPool {
        sqlx::PgPool::connect_lazy("postgres://localhost/tokoku_unreachable").unwrap()
    }

    #[tokio::test]
    async fn test_numeric_rules() {
        let pool = lazy_pool();
        let categories = CategoryRepository::new(&pool);
        let data = form(&[
            ("name", "Beras Pandan Wangi"),
            ("unit", "kg"),
            ("price", "dua ribu"),
            ("stock", "-1"),
            ("discount", "150"),
        ]);

        let errors = validate_item(&data, &categories).await.unwrap().unwrap_err();
        assert_eq!(errors.first("category_id"), Some("The category field is required."));
        assert_eq!(errors.first("price"), Some("The price must be a number."));
        assert_eq!(errors.first("stock"), Some("The stock must be at least 0."));
        assert_eq!(
            errors.first("discount"),
            Some("The discount must be between 0 and 100.")
        );
        assert!(!errors.has("name"));
        assert!(!errors.has("unit"));
    }

    #[tokio::test]
    async fn test_negative_price_and_bad_date() {
        let pool = lazy_pool();
        let categories = CategoryRepository::new(&pool);
        let data = form(&[("price", "-500"), ("expired_at", "besok")]);

        let errors = validate_item(&data, &categories).await.unwrap().unwrap_err();
        assert_eq!(errors.first("price"), Some("The price must be at least 0."));
        assert_eq!(
            errors.first("expired_at"),
            Some("The expired at is not a valid date.")
        );
        assert_eq!(errors.first("stock"), Some("The stock field is required."));
    }

    #[test]
    fn test_into_input_carries_image_path() {
        let form = ItemForm {
            category_id: CategoryId::new(3),
            name: "Gula".to_string(),
            unit: "kg".to_string(),
            price: Price::new(Decimal::new(15_000, 0)),
            stock: 4,
            is_available: true,
            description: None,
            discount: 0,
            expired_at: None,
            image: None,
        };
        let input = form.into_input(Some("img/items/a.png".to_string()));
        assert_eq!(input.image_url.as_deref(), Some("img/items/a.png"));
        assert_eq!(input.category_id, CategoryId::new(3));
    }
}
