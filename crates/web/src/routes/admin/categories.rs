//! Category management handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use tokoku_core::CategoryId;

use super::AdminContext;
use crate::components::{DataTableConfig, TableState, data_table::categories_table_config};
use crate::db::{CategoryRepository, ListParams, ListQuery, Page};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, wants_json};
use crate::models::{Category, CategoryRelation, CurrentUser};
use crate::requests::{CategoryForm, FormData, validate_category};
use crate::resources::CategoryResource;
use crate::routes::support::{
    BulkIds, BulkVerb, FormState, Noun, bulk_outcome, invalid, transition_outcome, write_done,
    write_failed,
};
use crate::services::ImageKind;
use crate::state::AppState;

const NOUN: Noun = Noun {
    singular: "category",
    plural: "categories",
};
const INDEX: &str = "/admin/categories";
const FIELDS: &[&str] = &["name", "description"];

/// Categories listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub ctx: AdminContext,
    pub table: DataTableConfig,
    pub state: TableState,
    pub page: Page<CategoryResource>,
}

/// Category detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/show.html")]
pub struct CategoryShowTemplate {
    pub ctx: AdminContext,
    pub category: CategoryResource,
}

/// Category create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/form.html")]
pub struct CategoryFormTemplate {
    pub ctx: AdminContext,
    pub form: FormState,
    pub category: Option<CategoryResource>,
}

impl CategoryFormTemplate {
    async fn new(
        admin: CurrentUser,
        session: &Session,
        form: FormState,
        category: Option<CategoryResource>,
    ) -> Self {
        Self {
            ctx: AdminContext::load(admin, session, INDEX).await,
            form,
            category,
        }
    }

    /// Where the form submits.
    #[must_use]
    pub fn action(&self) -> String {
        self.category
            .as_ref()
            .map_or_else(|| INDEX.to_string(), |c| format!("{INDEX}/{}", c.id))
    }
}

fn stored_values(category: &Category) -> FormState {
    FormState::with_values([
        ("name", category.name.clone()),
        ("description", category.description.clone().unwrap_or_default()),
    ])
}

async fn find(state: &AppState, id: CategoryId, with: &[CategoryRelation]) -> Result<Category> {
    CategoryRepository::new(state.pool())
        .get_by_id(id, with)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))
}

/// Categories listing, with item counts.
#[instrument(skip(admin, session, state, headers))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let params = ListParams::from(&query);
    let page = CategoryRepository::new(state.pool())
        .list(&params, &[])
        .await?
        .map(|category| CategoryResource::from(&category));

    if wants_json(&headers) {
        return Ok(Json(page).into_response());
    }

    Ok(CategoriesIndexTemplate {
        ctx: AdminContext::load(admin, &session, INDEX).await,
        table: categories_table_config(),
        state: TableState::new(INDEX, &params),
        page,
    }
    .into_response())
}

/// Category detail with its items.
#[instrument(skip(admin, session, state, headers))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let category = CategoryResource::from(&find(&state, id, &[CategoryRelation::Items]).await?);

    if wants_json(&headers) {
        return Ok(Json(category).into_response());
    }

    let path = format!("{INDEX}/{id}");
    Ok(CategoryShowTemplate {
        ctx: AdminContext::load(admin, &session, &path).await,
        category,
    }
    .into_response())
}

/// Create form.
#[instrument(skip_all)]
pub async fn create(RequireAdmin(admin): RequireAdmin, session: Session) -> CategoryFormTemplate {
    CategoryFormTemplate::new(admin, &session, FormState::new(), None).await
}

/// Store a new category.
#[instrument(skip_all)]
pub async fn store(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormData,
) -> Response {
    let back = format!("{INDEX}/create");
    let categories = CategoryRepository::new(state.pool());
    let input = match validate_category(&form, None, &categories).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = CategoryFormTemplate::new(admin, &session, values, None).await;
            return invalid(&headers, &errors, page);
        }
        Err(e) => {
            return write_failed(&session, &headers, &back, e.into(), "Failed to create category.").await;
        }
    };

    match create_category(&state, input).await {
        Ok(category) => {
            tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
            let location = format!("{INDEX}?highlight={}", category.id);
            write_done(&session, &headers, &location, "Category created successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e, "Failed to create category.").await,
    }
}

async fn create_category(state: &AppState, input: CategoryForm) -> Result<Category> {
    let image_url = match input.image.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Category, file).await?),
        None => None,
    };

    let result = CategoryRepository::new(state.pool())
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
    Path(id): Path<CategoryId>,
) -> Result<CategoryFormTemplate> {
    let category = find(&state, id, &[]).await?;
    let form = stored_values(&category);
    let resource = Some(CategoryResource::from(&category));
    Ok(CategoryFormTemplate::new(admin, &session, form, resource).await)
}

/// Update a category. A new image replaces the stored one.
#[instrument(skip(admin, session, state, headers, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
    form: FormData,
) -> Result<Response> {
    let existing = find(&state, id, &[]).await?;
    let back = format!("{INDEX}/{id}/edit");

    let categories = CategoryRepository::new(state.pool());
    let input = match validate_category(&form, Some(id), &categories).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let resource = Some(CategoryResource::from(&existing));
            let page = CategoryFormTemplate::new(admin, &session, values, resource).await;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to update category.").await);
        }
    };

    Ok(match update_category(&state, &existing, input).await {
        Ok(category) => {
            tracing::info!(category_id = %category.id, "Category updated");
            let location = format!("{INDEX}?highlight={}", category.id);
            write_done(&session, &headers, &location, "Category updated successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e, "Failed to update category.").await,
    })
}

async fn update_category(
    state: &AppState,
    existing: &Category,
    input: CategoryForm,
) -> Result<Category> {
    let uploaded = match input.image.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Category, file).await?),
        None => None,
    };
    let image_url = uploaded.clone().or_else(|| existing.image_url.clone());

    match CategoryRepository::new(state.pool())
        .update(existing.id, &input.into_input(image_url))
        .await
    {
        Ok(category) => {
            if uploaded.is_some()
                && let Some(old) = existing.image_url.as_deref()
            {
                state.images().remove(old).await;
            }
            Ok(category)
        }
        Err(e) => {
            if let Some(path) = uploaded.as_deref() {
                state.images().remove(path).await;
            }
            Err(AppError::from(e))
        }
    }
}

/// Soft-delete a category.
#[instrument(skip(_admin, session, state, headers))]
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let result = CategoryRepository::new(state.pool()).delete(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore a soft-deleted category.
#[instrument(skip(_admin, session, state, headers))]
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let result = CategoryRepository::new(state.pool()).restore(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}

/// Soft-delete the selected categories.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_delete(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = CategoryRepository::new(state.pool()).bulk_delete(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore the selected categories.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = CategoryRepository::new(state.pool()).bulk_restore(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}
