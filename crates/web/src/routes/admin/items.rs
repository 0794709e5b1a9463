//! Item management handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tokoku_core::{CategoryId, ItemId};

use super::AdminContext;
use crate::components::{
    DataTableConfig, FilterOption, TableState, data_table::items_table_config,
};
use crate::db::{CategoryRepository, ItemRepository, ListParams, ListQuery, Page};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, wants_json};
use crate::models::{CurrentUser, Item, ItemRelation};
use crate::requests::{FormData, ItemForm, validate_item};
use crate::resources::{CategorySummaryResource, ItemResource};
use crate::routes::support::{
    BulkIds, BulkVerb, FormState, Noun, bulk_outcome, invalid, transition_outcome, write_done,
    write_failed,
};
use crate::services::ImageKind;
use crate::state::AppState;

const NOUN: Noun = Noun {
    singular: "item",
    plural: "items",
};
const INDEX: &str = "/admin/items";
const FIELDS: &[&str] = &[
    "category_id",
    "name",
    "unit",
    "price",
    "stock",
    "is_available",
    "description",
    "discount",
    "expired_at",
];

/// Items listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/items/index.html")]
pub struct ItemsIndexTemplate {
    pub ctx: AdminContext,
    pub table: DataTableConfig,
    pub state: TableState,
    pub page: Page<ItemResource>,
}

/// Item create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/items/form.html")]
pub struct ItemFormTemplate {
    pub ctx: AdminContext,
    pub form: FormState,
    pub item: Option<ItemResource>,
    pub categories: Vec<CategorySummaryResource>,
}

impl ItemFormTemplate {
    async fn load(
        state: &AppState,
        admin: CurrentUser,
        session: &Session,
        form: FormState,
        item: Option<ItemResource>,
    ) -> Result<Self> {
        let categories = CategoryRepository::new(state.pool())
            .options()
            .await?
            .iter()
            .map(CategorySummaryResource::from)
            .collect();
        Ok(Self {
            ctx: AdminContext::load(admin, session, INDEX).await,
            form,
            item,
            categories,
        })
    }

    /// Where the form submits.
    #[must_use]
    pub fn action(&self) -> String {
        self.item
            .as_ref()
            .map_or_else(|| INDEX.to_string(), |i| format!("{INDEX}/{}", i.id))
    }
}

/// Query for the create form.
#[derive(Debug, Default, Deserialize)]
pub struct CreateQuery {
    /// Category to preselect.
    pub category: Option<String>,
}

impl CreateQuery {
    fn category(&self) -> Option<CategoryId> {
        self.category
            .as_deref()
            .and_then(|c| c.trim().parse().ok())
            .map(CategoryId::new)
    }
}

fn stored_values(item: &Item) -> FormState {
    FormState::with_values([
        ("category_id", item.category_id.to_string()),
        ("name", item.name.clone()),
        ("unit", item.unit.clone()),
        ("price", item.price.amount().to_string()),
        ("stock", item.stock.to_string()),
        (
            "is_available",
            if item.is_available { "1" } else { "" }.to_string(),
        ),
        ("description", item.description.clone().unwrap_or_default()),
        ("discount", item.discount.to_string()),
        (
            "expired_at",
            item.expired_at.map(|d| d.to_string()).unwrap_or_default(),
        ),
    ])
}

async fn find(state: &AppState, id: ItemId) -> Result<Item> {
    ItemRepository::new(state.pool())
        .get_by_id(id, &[ItemRelation::Category])
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {id}")))
}

/// Items listing, with each item's category. `category_id` narrows the
/// listing to one category.
#[instrument(skip(admin, session, state, headers))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let params = ListParams::from(&query);
    let page = ItemRepository::new(state.pool())
        .list(&params, &[ItemRelation::Category])
        .await?
        .map(|item| ItemResource::from(&item));

    if wants_json(&headers) {
        return Ok(Json(page).into_response());
    }

    let categories = CategoryRepository::new(state.pool())
        .options()
        .await?
        .iter()
        .map(|c| FilterOption::new(&c.id.to_string(), &c.name))
        .collect();

    Ok(ItemsIndexTemplate {
        ctx: AdminContext::load(admin, &session, INDEX).await,
        table: items_table_config(categories),
        state: TableState::new(INDEX, &params),
        page,
    }
    .into_response())
}

/// Create form, optionally bound to `?category=`.
#[instrument(skip(admin, session, state))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<CreateQuery>,
) -> Result<ItemFormTemplate> {
    let mut form = FormState::new()
        .default_value("is_available", "1")
        .default_value("discount", "0");
    if let Some(category) = query.category() {
        form = form.default_value("category_id", category.to_string());
    }
    ItemFormTemplate::load(&state, admin, &session, form, None).await
}

/// Store a new item.
#[instrument(skip_all)]
pub async fn store(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormData,
) -> Result<Response> {
    let back = format!("{INDEX}/create");
    let categories = CategoryRepository::new(state.pool());
    let input = match validate_item(&form, &categories).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = ItemFormTemplate::load(&state, admin, &session, values, None).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to create item.").await);
        }
    };

    Ok(match create_item(&state, input).await {
        Ok(item) => {
            tracing::info!(item_id = %item.id, category_id = %item.category_id, "Item created");
            let location = format!("{INDEX}?highlight={}", item.id);
            write_done(&session, &headers, &location, "Item created successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e, "Failed to create item.").await,
    })
}

async fn create_item(state: &AppState, input: ItemForm) -> Result<Item> {
    let image_url = match input.image.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Item, file).await?),
        None => None,
    };

    let result = ItemRepository::new(state.pool())
        .create(&input.into_input(image_url.clone()))
        .await;
    if result.is_err()
        && let Some(path) = image_url.as_deref()
    {
        state.images().remove(path).await;
    }
    result.map_err(AppError::from)
}

/// Edit form.
#[instrument(skip(admin, session, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<ItemFormTemplate> {
    let item = find(&state, id).await?;
    let form = stored_values(&item);
    ItemFormTemplate::load(&state, admin, &session, form, Some(ItemResource::from(&item))).await
}

/// Update an item. A new image replaces the stored one.
#[instrument(skip(admin, session, state, headers, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ItemId>,
    form: FormData,
) -> Result<Response> {
    let existing = find(&state, id).await?;
    let back = format!("{INDEX}/{id}/edit");

    let categories = CategoryRepository::new(state.pool());
    let input = match validate_item(&form, &categories).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let item = Some(ItemResource::from(&existing));
            let page = ItemFormTemplate::load(&state, admin, &session, values, item).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to update item.").await);
        }
    };

    Ok(match update_item(&state, &existing, input).await {
        Ok(item) => {
            tracing::info!(item_id = %item.id, "Item updated");
            let location = format!("{INDEX}?highlight={}", item.id);
            write_done(&session, &headers, &location, "Item updated successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e, "Failed to update item.").await,
    })
}

async fn update_item(state: &AppState, existing: &Item, input: ItemForm) -> Result<Item> {
    let uploaded = match input.image.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Item, file).await?),
        None => None,
    };
    let image_url = uploaded.clone().or_else(|| existing.image_url.clone());

    match ItemRepository::new(state.pool())
        .update(existing.id, &input.into_input(image_url))
        .await
    {
        Ok(item) => {
            if uploaded.is_some()
                && let Some(old) = existing.image_url.as_deref()
            {
                state.images().remove(old).await;
            }
            Ok(item)
        }
        Err(e) => {
            if let Some(path) = uploaded.as_deref() {
                state.images().remove(path).await;
            }
            Err(AppError::from(e))
        }
    }
}

/// Soft-delete an item.
#[instrument(skip(_admin, session, state, headers))]
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ItemId>,
) -> Result<Response> {
    let result = ItemRepository::new(state.pool()).delete(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore a soft-deleted item.
#[instrument(skip(_admin, session, state, headers))]
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ItemId>,
) -> Result<Response> {
    let result = ItemRepository::new(state.pool()).restore(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}

/// Soft-delete the selected items.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_delete(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = ItemRepository::new(state.pool()).bulk_delete(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore the selected items.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = ItemRepository::new(state.pool()).bulk_restore(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}
