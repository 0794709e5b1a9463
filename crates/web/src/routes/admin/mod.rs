//! Admin panel route handlers.
//!
//! Every handler takes [`RequireAdmin`]. Each resource exposes the same
//! routes:
//!
//! ```text
//! GET    /admin/R                  - Listing (HTML, or JSON on request)
//! GET    /admin/R/create           - Create form
//! POST   /admin/R                  - Store
//! GET    /admin/R/{id}/edit        - Edit form
//! PUT    /admin/R/{id}             - Update (also POST)
//! DELETE /admin/R/{id}             - Soft-delete (also POST /admin/R/{id}/delete)
//! POST   /admin/R/{id}/restore     - Restore
//! POST   /admin/R/bulk-delete      - Bulk soft-delete
//! POST   /admin/R/bulk-restore     - Bulk restore
//! ```
//!
//! plus `GET /admin/categories/{id}` for a category with its items.

pub mod addresses;
pub mod categories;
pub mod contacts;
pub mod dashboard;
pub mod items;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::take_flash;
use crate::models::{CurrentUser, FlashMessage};
use crate::state::AppState;

/// Largest accepted request body: a 5MB image plus the other fields.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Layout data shared by every admin page.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub user: CurrentUser,
    pub flash: Option<FlashMessage>,
    pub current_path: String,
}

impl AdminContext {
    /// Build the context for `path`, consuming any pending flash message.
    pub async fn load(user: CurrentUser, session: &Session, path: &str) -> Self {
        Self {
            user,
            flash: take_flash(session).await,
            current_path: path.to_string(),
        }
    }

    /// Whether the sidebar entry for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/admin" {
            return self.current_path == "/admin";
        }
        self.current_path == prefix || self.current_path.starts_with(&format!("{prefix}/"))
    }
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::store))
        .route("/create", get(users::create))
        .route("/bulk-delete", post(users::bulk_delete))
        .route("/bulk-restore", post(users::bulk_restore))
        .route(
            "/{id}",
            axum::routing::put(users::update)
                .post(users::update)
                .delete(users::destroy),
        )
        .route("/{id}/edit", get(users::edit))
        .route("/{id}/delete", post(users::destroy))
        .route("/{id}/restore", post(users::restore))
}

/// Create the contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::index).post(contacts::store))
        .route("/create", get(contacts::create))
        .route("/bulk-delete", post(contacts::bulk_delete))
        .route("/bulk-restore", post(contacts::bulk_restore))
        .route(
            "/{id}",
            axum::routing::put(contacts::update)
                .post(contacts::update)
                .delete(contacts::destroy),
        )
        .route("/{id}/edit", get(contacts::edit))
        .route("/{id}/delete", post(contacts::destroy))
        .route("/{id}/restore", post(contacts::restore))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::store))
        .route("/create", get(addresses::create))
        .route("/bulk-delete", post(addresses::bulk_delete))
        .route("/bulk-restore", post(addresses::bulk_restore))
        .route(
            "/{id}",
            axum::routing::put(addresses::update)
                .post(addresses::update)
                .delete(addresses::destroy),
        )
        .route("/{id}/edit", get(addresses::edit))
        .route("/{id}/delete", post(addresses::destroy))
        .route("/{id}/restore", post(addresses::restore))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::store))
        .route("/create", get(categories::create))
        .route("/bulk-delete", post(categories::bulk_delete))
        .route("/bulk-restore", post(categories::bulk_restore))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .post(categories::update)
                .delete(categories::destroy),
        )
        .route("/{id}/edit", get(categories::edit))
        .route("/{id}/delete", post(categories::destroy))
        .route("/{id}/restore", post(categories::restore))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index).post(items::store))
        .route("/create", get(items::create))
        .route("/bulk-delete", post(items::bulk_delete))
        .route("/bulk-restore", post(items::bulk_restore))
        .route(
            "/{id}",
            axum::routing::put(items::update)
                .post(items::update)
                .delete(items::destroy),
        )
        .route("/{id}/edit", get(items::edit))
        .route("/{id}/delete", post(items::destroy))
        .route("/{id}/restore", post(items::restore))
}

/// Create all admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/users", user_routes())
        .nest("/contacts", contact_routes())
        .nest("/addresses", address_routes())
        .nest("/categories", category_routes())
        .nest("/items", item_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use tokoku_core::{Email, UserId, UserRole};

    use super::*;

    fn context(path: &str) -> AdminContext {
        let Ok(email) = Email::parse("admin@tokoku.test") else {
            panic!("valid email");
        };
        AdminContext {
            user: CurrentUser {
                id: UserId::new(1),
                username: "admin".to_string(),
                email,
                role: UserRole::Admin,
            },
            flash: None,
            current_path: path.to_string(),
        }
    }

    #[test]
    fn test_sidebar_sections() {
        let ctx = context("/admin/items/create");
        assert!(ctx.is_active("/admin/items"));
        assert!(!ctx.is_active("/admin/users"));
        assert!(!ctx.is_active("/admin"));

        let ctx = context("/admin");
        assert!(ctx.is_active("/admin"));
        assert!(!ctx.is_active("/admin/itemsx"));
    }
}
