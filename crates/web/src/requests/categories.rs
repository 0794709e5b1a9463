//! Category validation.

use tokoku_core::{CategoryId, slugify};

use super::{FormData, Rules, Validated};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::CategoryInput;
use crate::services::UploadedFile;

/// Validated category fields. The slug is derived from the name.
#[derive(Debug, Clone)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<UploadedFile>,
}

impl CategoryForm {
    /// Combine with the stored path of the uploaded image, if one was sent.
    #[must_use]
    pub fn into_input(self, image_url: Option<String>) -> CategoryInput {
        CategoryInput {
            name: self.name,
            slug: self.slug,
            description: self.description,
            image_url,
        }
    }
}

/// Validate category fields. `except` is the category being edited, which
/// may keep its own slug.
///
/// # Errors
///
/// Returns `RepositoryError` if the slug lookup fails.
pub async fn validate_category(
    form: &FormData,
    except: Option<CategoryId>,
    categories: &CategoryRepository<'_>,
) -> Result<Validated<CategoryForm>, RepositoryError> {
    let mut rules = Rules::new(form);

    let name = rules.required("name", "The name field is required.");
    rules.max_chars(
        "name",
        name.as_deref(),
        100,
        "The name may not be greater than 100 characters.",
    );

    let slug = name.as_deref().map(slugify);
    if slug.as_deref().is_some_and(str::is_empty) {
        rules.fail("name", "The name must contain letters or numbers.");
    }

    let description = rules.optional("description");
    let image = rules.image(
        "image_url",
        5120,
        "The image must be a file of type: jpg, jpeg, png.",
        "The image may not be larger than 5MB.",
    );

    if let Some(slug) = slug.as_deref()
        && !rules.has_error("name")
        && categories.slug_taken(slug, except).await?
    {
        rules.fail("name", "This category already exists.");
    }

    Ok(rules.finish(|| {
        Some(CategoryForm {
            name: name?,
            slug: slug?,
            description,
            image,
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Bytes;

    use super::super::{FormData, tests::form};
    use super::*;

    fn lazy_pool() -> sqlx::PgPool {
        sqlx::PgPool::connect_lazy("postgres://localhost/tokoku_unreachable").unwrap()
    }

    #[tokio::test]
    async fn test_name_is_required() {
        let pool = lazy_pool();
        let categories = CategoryRepository::new(&pool);
        let errors = validate_category(&form(&[("name", "  ")]), None, &categories)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(errors.first("name"), Some("The name field is required."));
    }

    #[tokio::test]
    async fn test_name_without_slug_characters() {
        let pool = lazy_pool();
        let categories = CategoryRepository::new(&pool);
        let errors = validate_category(&form(&[("name", "!!!")]), None, &categories)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(
            errors.first("name"),
            Some("The name must contain letters or numbers.")
        );
    }

    #[tokio::test]
    async fn test_rejects_non_image_upload() {
        let pool = lazy_pool();
        let categories = CategoryRepository::new(&pool);
        let mut data = FormData::default();
        data.files.push((
            "image_url".to_string(),
            UploadedFile {
                file_name: "menu.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                bytes: Bytes::from_static(b"%PDF"),
            },
        ));

        let errors = validate_category(&data, None, &categories)
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(
            errors.first("image_url"),
            Some("The image must be a file of type: jpg, jpeg, png.")
        );
    }
}
