//! Contact management handlers.

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

use tokoku_core::{ContactId, Gender};

use super::AdminContext;
use crate::components::{DataTableConfig, TableState, data_table::contacts_table_config};
use crate::db::{ContactRepository, ListParams, ListQuery, Page, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, wants_json};
use crate::models::{Contact, ContactRelation, CurrentUser};
use crate::requests::{FormData, validate_contact};
use crate::resources::{ContactResource, UserSummaryResource};
use crate::routes::support::{
    BulkIds, BulkVerb, FormState, Noun, bulk_outcome, invalid, transition_outcome, write_done,
    write_failed,
};
use crate::state::AppState;

const NOUN: Noun = Noun {
    singular: "contact",
    plural: "contacts",
};
const INDEX: &str = "/admin/contacts";
const FIELDS: &[&str] = &["user_id", "name", "phone", "profile", "gender", "birthday"];

/// Contacts listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/contacts/index.html")]
pub struct ContactsIndexTemplate {
    pub ctx: AdminContext,
    pub table: DataTableConfig,
    pub state: TableState,
    pub page: Page<ContactResource>,
}

/// Contact create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/contacts/form.html")]
pub struct ContactFormTemplate {
    pub ctx: AdminContext,
    pub form: FormState,
    pub contact: Option<ContactResource>,
    pub users: Vec<UserSummaryResource>,
    pub genders: &'static [Gender],
}

impl ContactFormTemplate {
    async fn load(
        state: &AppState,
        admin: CurrentUser,
        session: &Session,
        form: FormState,
        contact: Option<ContactResource>,
    ) -> Result<Self> {
        let users = UserRepository::new(state.pool())
            .options()
            .await?
            .iter()
            .map(UserSummaryResource::from)
            .collect();
        Ok(Self {
            ctx: AdminContext::load(admin, session, INDEX).await,
            form,
            contact,
            users,
            genders: &Gender::ALL,
        })
    }

    /// Where the form submits.
    #[must_use]
    pub fn action(&self) -> String {
        self.contact
            .as_ref()
            .map_or_else(|| INDEX.to_string(), |c| format!("{INDEX}/{}", c.id))
    }
}

fn stored_values(contact: &Contact) -> FormState {
    FormState::with_values([
        ("user_id", contact.user_id.to_string()),
        ("name", contact.name.clone()),
        ("phone", contact.phone.clone()),
        ("profile", contact.profile.clone().unwrap_or_default()),
        ("gender", contact.gender.as_str().to_string()),
        (
            "birthday",
            contact.birthday.map(|d| d.to_string()).unwrap_or_default(),
        ),
    ])
}

async fn find(state: &AppState, id: ContactId) -> Result<Contact> {
    ContactRepository::new(state.pool())
        .get_by_id(id, &[ContactRelation::User])
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contact {id}")))
}

/// Contacts listing, with each contact's user.
#[instrument(skip(admin, session, state, headers))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let params = ListParams::from(&query);
    let page = ContactRepository::new(state.pool())
        .list(&params, &[ContactRelation::User])
        .await?
        .map(|contact| ContactResource::from(&contact));

    if wants_json(&headers) {
        return Ok(Json(page).into_response());
    }

    Ok(ContactsIndexTemplate {
        ctx: AdminContext::load(admin, &session, INDEX).await,
        table: contacts_table_config(),
        state: TableState::new(INDEX, &params),
        page,
    }
    .into_response())
}

/// Create form.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
) -> Result<ContactFormTemplate> {
    ContactFormTemplate::load(&state, admin, &session, FormState::new(), None).await
}

/// Store a new contact.
#[instrument(skip_all)]
pub async fn store(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormData,
) -> Result<Response> {
    let back = format!("{INDEX}/create");
    let input = match validate_contact(&form, &UserRepository::new(state.pool())).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = ContactFormTemplate::load(&state, admin, &session, values, None).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to create contact.").await);
        }
    };

    Ok(match ContactRepository::new(state.pool()).create(&input).await {
        Ok(contact) => {
            tracing::info!(contact_id = %contact.id, "Contact created");
            let location = format!("{INDEX}?highlight={}", contact.id);
            write_done(&session, &headers, &location, "Contact created successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e.into(), "Failed to create contact.").await,
    })
}

/// Edit form.
#[instrument(skip(admin, session, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<ContactFormTemplate> {
    let contact = find(&state, id).await?;
    let form = stored_values(&contact);
    ContactFormTemplate::load(&state, admin, &session, form, Some(ContactResource::from(&contact)))
        .await
}

/// Update a contact.
#[instrument(skip(admin, session, state, headers, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
    form: FormData,
) -> Result<Response> {
    let existing = find(&state, id).await?;
    let back = format!("{INDEX}/{id}/edit");

    let input = match validate_contact(&form, &UserRepository::new(state.pool())).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let contact = Some(ContactResource::from(&existing));
            let page = ContactFormTemplate::load(&state, admin, &session, values, contact).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to update contact.").await);
        }
    };

    Ok(match ContactRepository::new(state.pool()).update(id, &input).await {
        Ok(contact) => {
            tracing::info!(contact_id = %contact.id, "Contact updated");
            let location = format!("{INDEX}?highlight={}", contact.id);
            write_done(&session, &headers, &location, "Contact updated successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e.into(), "Failed to update contact.").await,
    })
}

/// Soft-delete a contact.
#[instrument(skip(_admin, session, state, headers))]
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
) -> Result<Response> {
    let result = ContactRepository::new(state.pool()).delete(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore a soft-deleted contact.
#[instrument(skip(_admin, session, state, headers))]
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
) -> Result<Response> {
    let result = ContactRepository::new(state.pool()).restore(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}

/// Soft-delete the selected contacts.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_delete(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = ContactRepository::new(state.pool()).bulk_delete(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore the selected contacts.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = ContactRepository::new(state.pool()).bulk_restore(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}
