//! Admin dashboard: record counts per resource.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use super::AdminContext;
use crate::db::{
    AddressRepository, CategoryRepository, ContactRepository, ItemRepository, RepositoryError,
    UserRepository,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// One dashboard card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCount {
    pub label: &'static str,
    pub href: &'static str,
    pub active: i64,
    pub deleted: i64,
}

impl ResourceCount {
    fn new(label: &'static str, href: &'static str, (active, deleted): (i64, i64)) -> Self {
        Self {
            label,
            href,
            active,
            deleted,
        }
    }

    /// Link to the deleted rows of this resource.
    #[must_use]
    pub fn deleted_href(&self) -> String {
        format!("{}?deleted_status=deleted", self.href)
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: AdminContext,
    pub counts: Vec<ResourceCount>,
}

async fn load_counts(state: &AppState) -> std::result::Result<Vec<ResourceCount>, RepositoryError> {
    let pool = state.pool();
    let users_repo = UserRepository::new(pool);
    let contacts_repo = ContactRepository::new(pool);
    let addresses_repo = AddressRepository::new(pool);
    let categories_repo = CategoryRepository::new(pool);
    let items_repo = ItemRepository::new(pool);

    let (users, contacts, addresses, categories, items) = tokio::try_join!(
        users_repo.counts(),
        contacts_repo.counts(),
        addresses_repo.counts(),
        categories_repo.counts(),
        items_repo.counts(),
    )?;
    Ok(vec![
        ResourceCount::new("Users", "/admin/users", users),
        ResourceCount::new("Contacts", "/admin/contacts", contacts),
        ResourceCount::new("Addresses", "/admin/addresses", addresses),
        ResourceCount::new("Categories", "/admin/categories", categories),
        ResourceCount::new("Items", "/admin/items", items),
    ])
}

/// Dashboard page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
) -> Result<DashboardTemplate> {
    let counts = load_counts(&state).await?;
    Ok(DashboardTemplate {
        ctx: AdminContext::load(admin, &session, "/admin").await,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deleted_link() {
        let count = ResourceCount::new("Items", "/admin/items", (4, 1));
        assert_eq!(count.active, 4);
        assert_eq!(count.deleted_href(), "/admin/items?deleted_status=deleted");
    }
}
