//! User management handlers.

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

use tokoku_core::{UserId, UserRole, UserStatus};

use super::AdminContext;
use crate::components::{DataTableConfig, TableState, data_table::users_table_config};
use crate::db::{ListParams, ListQuery, Page, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, wants_json};
use crate::models::{CurrentUser, NewUser, User, UserChanges};
use crate::requests::{FormData, UserForm, validate_store_user, validate_update_user};
use crate::resources::UserResource;
use crate::routes::support::{
    BulkIds, BulkVerb, FormState, Noun, bulk_outcome, invalid, transition_outcome, write_done,
    write_failed,
};
use crate::services::{ImageKind, hash_password};
use crate::state::AppState;

const NOUN: Noun = Noun {
    singular: "user",
    plural: "users",
};
const INDEX: &str = "/admin/users";
const FIELDS: &[&str] = &["google_id", "username", "email", "role", "status"];

/// Users listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users/index.html")]
pub struct UsersIndexTemplate {
    pub ctx: AdminContext,
    pub table: DataTableConfig,
    pub state: TableState,
    pub page: Page<UserResource>,
}

/// User create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users/form.html")]
pub struct UserFormTemplate {
    pub ctx: AdminContext,
    pub form: FormState,
    pub user: Option<UserResource>,
    pub roles: &'static [UserRole],
    pub statuses: &'static [UserStatus],
}

impl UserFormTemplate {
    async fn new(
        admin: CurrentUser,
        session: &Session,
        form: FormState,
        user: Option<UserResource>,
    ) -> Self {
        Self {
            ctx: AdminContext::load(admin, session, INDEX).await,
            form,
            user,
            roles: &UserRole::ALL,
            statuses: &UserStatus::ALL,
        }
    }

    /// Where the form submits.
    #[must_use]
    pub fn action(&self) -> String {
        self.user
            .as_ref()
            .map_or_else(|| INDEX.to_string(), |u| format!("{INDEX}/{}", u.id))
    }
}

fn stored_values(user: &User) -> FormState {
    FormState::with_values([
        ("google_id", user.google_id.clone().unwrap_or_default()),
        ("username", user.username.clone()),
        ("email", user.email.as_str().to_string()),
        ("role", user.role.as_str().to_string()),
        ("status", user.status.as_str().to_string()),
    ])
}

/// Users listing.
#[instrument(skip(admin, session, state, headers))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let params = ListParams::from(&query);
    let page = UserRepository::new(state.pool())
        .list(&params)
        .await?
        .map(|user| UserResource::from(&user));

    if wants_json(&headers) {
        return Ok(Json(page).into_response());
    }

    Ok(UsersIndexTemplate {
        ctx: AdminContext::load(admin, &session, INDEX).await,
        table: users_table_config(),
        state: TableState::new(INDEX, &params),
        page,
    }
    .into_response())
}

/// Create form.
#[instrument(skip_all)]
pub async fn create(RequireAdmin(admin): RequireAdmin, session: Session) -> UserFormTemplate {
    let form = FormState::new()
        .default_value("role", UserRole::Client.as_str())
        .default_value("status", UserStatus::Active.as_str());
    UserFormTemplate::new(admin, &session, form, None).await
}

/// Store a new user.
#[instrument(skip_all)]
pub async fn store(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormData,
) -> Response {
    let users = UserRepository::new(state.pool());
    let input = match validate_store_user(&form, &users).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = UserFormTemplate::new(admin, &session, values, None).await;
            return invalid(&headers, &errors, page);
        }
        Err(e) => {
            let back = format!("{INDEX}/create");
            return write_failed(&session, &headers, &back, e.into(), "Failed to create user.").await;
        }
    };

    match create_user(&state, input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            let location = format!("{INDEX}?highlight={}", user.id);
            write_done(&session, &headers, &location, "User created successfully.".to_string()).await
        }
        Err(e) => {
            let back = format!("{INDEX}/create");
            write_failed(&session, &headers, &back, e, "Failed to create user.").await
        }
    }
}

async fn create_user(state: &AppState, input: UserForm) -> Result<User> {
    let Some(password) = input.password.as_deref() else {
        return Err(AppError::BadRequest("The password field is required.".to_string()));
    };
    let password_hash =
        hash_password(password).map_err(|e| AppError::Internal(format!("hash password: {e}")))?;

    let avatar = match input.avatar.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Avatar, file).await?),
        None => None,
    };

    let new_user = NewUser {
        google_id: input.google_id,
        username: input.username,
        email: input.email,
        password_hash,
        avatar: avatar.clone(),
        role: input.role,
        status: input.status,
    };

    match UserRepository::new(state.pool()).create(&new_user).await {
        Ok(user) => Ok(user),
        Err(e) => {
            if let Some(path) = avatar.as_deref() {
                state.images().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Edit form.
#[instrument(skip(admin, session, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<UserFormTemplate> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    let form = stored_values(&user);
    Ok(UserFormTemplate::new(admin, &session, form, Some(UserResource::from(&user))).await)
}

/// Update a user.
#[instrument(skip(admin, session, state, headers, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    form: FormData,
) -> Result<Response> {
    let users = UserRepository::new(state.pool());
    let existing = users
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    let back = format!("{INDEX}/{id}/edit");

    let input = match validate_update_user(id, &form, &users).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = UserFormTemplate::new(
                admin,
                &session,
                values,
                Some(UserResource::from(&existing)),
            )
            .await;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to update user.").await);
        }
    };

    Ok(match update_user(&state, &existing, input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User updated");
            let location = format!("{INDEX}?highlight={}", user.id);
            write_done(&session, &headers, &location, "User updated successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e, "Failed to update user.").await,
    })
}

async fn update_user(state: &AppState, existing: &User, input: UserForm) -> Result<User> {
    let password_hash = input
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(|e| AppError::Internal(format!("hash password: {e}")))?;

    let avatar = match input.avatar.as_ref() {
        Some(file) => Some(state.images().store(ImageKind::Avatar, file).await?),
        None => None,
    };

    let changes = UserChanges {
        google_id: input.google_id,
        username: input.username,
        email: input.email,
        password_hash,
        avatar: avatar.clone(),
        role: input.role,
        status: input.status,
    };

    match UserRepository::new(state.pool()).update(existing.id, &changes).await {
        Ok(user) => {
            if avatar.is_some()
                && let Some(old) = existing.avatar.as_deref()
            {
                state.images().remove(old).await;
            }
            Ok(user)
        }
        Err(e) => {
            if let Some(path) = avatar.as_deref() {
                state.images().remove(path).await;
            }
            Err(e.into())
        }
    }
}

/// Soft-delete a user.
#[instrument(skip(_admin, session, state, headers))]
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
) -> Result<Response> {
    let result = UserRepository::new(state.pool()).delete(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore a soft-deleted user.
#[instrument(skip(_admin, session, state, headers))]
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
) -> Result<Response> {
    let result = UserRepository::new(state.pool()).restore(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}

/// Soft-delete the selected users.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_delete(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = UserRepository::new(state.pool()).bulk_delete(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore the selected users.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = UserRepository::new(state.pool()).bulk_restore(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}
