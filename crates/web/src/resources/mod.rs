//! JSON and template shapes for persisted entities.
//!
//! Each resource is built from a model with `From<&Model>`. Relations are
//! carried as [`Relation`](crate::models::Relation) and omitted from the
//! output when the query did not load them. Password hashes never reach a
//! model, so they cannot leak through here.

pub mod addresses;
pub mod categories;
pub mod contacts;
pub mod favorites;
pub mod items;
pub mod users;

pub use addresses::AddressResource;
pub use categories::{CategoryResource, CategorySummaryResource};
pub use contacts::{ContactResource, ContactSummaryResource};
pub use favorites::FavoriteResponse;
pub use items::{CatalogItemResource, ItemResource};
pub use users::{UserResource, UserSummaryResource};

/// Public URL of a stored upload, or the value itself when it is already a
/// full URL (avatars imported from Google).
#[must_use]
pub fn storage_url(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("/storage/{}", path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url() {
        assert_eq!(storage_url("img/items/a.png"), "/storage/img/items/a.png");
        assert_eq!(
            storage_url("https://lh3.googleusercontent.com/a/x"),
            "https://lh3.googleusercontent.com/a/x"
        );
    }
}
