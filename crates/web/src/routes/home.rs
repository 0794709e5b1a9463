//! Storefront home page: item search and popular items.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{ItemRepository, Page};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalUser, take_flash, wants_json};
use crate::models::{CurrentUser, FlashMessage};
use crate::resources::CatalogItemResource;
use crate::state::AppState;

const CATALOG_PER_PAGE: u32 = 12;
const POPULAR_LIMIT: u32 = 8;

/// Query parameters for the storefront search.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub page: Option<String>,
}

impl CatalogQuery {
    fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Option<FlashMessage>,
    pub search: String,
    pub items: Page<CatalogItemResource>,
    pub popular: Vec<CatalogItemResource>,
}

impl HomeTemplate {
    /// Link to another page of the current search.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        if self.search.is_empty() {
            format!("/?page={page}")
        } else {
            format!("/?search={}&page={page}", urlencoding::encode(&self.search))
        }
    }
}

#[derive(Serialize)]
struct HomeBody {
    items: Page<CatalogItemResource>,
    popular: Vec<CatalogItemResource>,
}

/// Storefront home handler.
#[instrument(skip(user, session, state, headers))]
pub async fn home(
    OptionalUser(user): OptionalUser,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CatalogQuery>,
) -> Result<Response> {
    let viewer = user.as_ref().map(|u| u.id);
    let repo = ItemRepository::new(state.pool());

    let items = repo
        .catalog(query.search(), query.page(), CATALOG_PER_PAGE, viewer)
        .await?
        .map(|entry| CatalogItemResource::from(&entry));
    let popular: Vec<CatalogItemResource> = repo
        .popular(POPULAR_LIMIT, viewer)
        .await?
        .iter()
        .map(CatalogItemResource::from)
        .collect();

    if wants_json(&headers) {
        return Ok(Json(HomeBody { items, popular }).into_response());
    }

    Ok(HomeTemplate {
        user,
        flash: take_flash(&session).await,
        search: query.search().unwrap_or_default().to_string(),
        items,
        popular,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let query = CatalogQuery {
            search: Some("   ".to_string()),
            page: Some("0".to_string()),
        };
        assert_eq!(query.search(), None);
        assert_eq!(query.page(), 1);

        let query = CatalogQuery {
            search: Some(" beras ".to_string()),
            page: Some("3".to_string()),
        };
        assert_eq!(query.search(), Some("beras"));
        assert_eq!(query.page(), 3);
    }

    #[test]
    fn test_page_url_keeps_search() {
        let template = HomeTemplate {
            user: None,
            flash: None,
            search: "gula pasir".to_string(),
            items: Page::new(Vec::new(), 1, CATALOG_PER_PAGE, 0),
            popular: Vec::new(),
        };
        assert_eq!(template.page_url(2), "/?search=gula%20pasir&page=2");
    }
}
