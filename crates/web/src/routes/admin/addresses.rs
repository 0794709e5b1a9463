//! Address management handlers.

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

use tokoku_core::AddressId;

use super::AdminContext;
use crate::components::{DataTableConfig, TableState, data_table::addresses_table_config};
use crate::db::{AddressRepository, ContactRepository, ListParams, ListQuery, Page};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdmin, wants_json};
use crate::models::{Address, AddressRelation, CurrentUser};
use crate::requests::{FormData, validate_address};
use crate::resources::{AddressResource, ContactSummaryResource};
use crate::routes::support::{
    BulkIds, BulkVerb, FormState, Noun, bulk_outcome, invalid, transition_outcome, write_done,
    write_failed,
};
use crate::state::AppState;

const NOUN: Noun = Noun {
    singular: "address",
    plural: "addresses",
};
const INDEX: &str = "/admin/addresses";
const FIELDS: &[&str] = &[
    "contact_id",
    "post_code",
    "country",
    "province",
    "city",
    "street",
    "more",
];

/// Addresses listing template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/addresses/index.html")]
pub struct AddressesIndexTemplate {
    pub ctx: AdminContext,
    pub table: DataTableConfig,
    pub state: TableState,
    pub page: Page<AddressResource>,
}

/// Address create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/addresses/form.html")]
pub struct AddressFormTemplate {
    pub ctx: AdminContext,
    pub form: FormState,
    pub address: Option<AddressResource>,
    pub contacts: Vec<ContactSummaryResource>,
}

impl AddressFormTemplate {
    async fn load(
        state: &AppState,
        admin: CurrentUser,
        session: &Session,
        form: FormState,
        address: Option<AddressResource>,
    ) -> Result<Self> {
        let contacts = ContactRepository::new(state.pool())
            .options()
            .await?
            .iter()
            .map(ContactSummaryResource::from)
            .collect();
        Ok(Self {
            ctx: AdminContext::load(admin, session, INDEX).await,
            form,
            address,
            contacts,
        })
    }

    /// Where the form submits.
    #[must_use]
    pub fn action(&self) -> String {
        self.address
            .as_ref()
            .map_or_else(|| INDEX.to_string(), |a| format!("{INDEX}/{}", a.id))
    }
}

fn stored_values(address: &Address) -> FormState {
    FormState::with_values([
        ("contact_id", address.contact_id.to_string()),
        ("post_code", address.post_code.clone()),
        ("country", address.country.clone()),
        ("province", address.province.clone()),
        ("city", address.city.clone()),
        ("street", address.street.clone()),
        ("more", address.more.clone().unwrap_or_default()),
    ])
}

async fn find(state: &AppState, id: AddressId) -> Result<Address> {
    AddressRepository::new(state.pool())
        .get_by_id(id, &[AddressRelation::Contact])
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))
}

/// Addresses listing, with each address's contact and its user.
#[instrument(skip(admin, session, state, headers))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let params = ListParams::from(&query);
    let page = AddressRepository::new(state.pool())
        .list(&params, &[AddressRelation::Contact])
        .await?
        .map(|address| AddressResource::from(&address));

    if wants_json(&headers) {
        return Ok(Json(page).into_response());
    }

    Ok(AddressesIndexTemplate {
        ctx: AdminContext::load(admin, &session, INDEX).await,
        table: addresses_table_config(),
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
) -> Result<AddressFormTemplate> {
    AddressFormTemplate::load(&state, admin, &session, FormState::new(), None).await
}

/// Store a new address.
#[instrument(skip_all)]
pub async fn store(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    form: FormData,
) -> Result<Response> {
    let back = format!("{INDEX}/create");
    let input = match validate_address(&form, &ContactRepository::new(state.pool())).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let page = AddressFormTemplate::load(&state, admin, &session, values, None).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to create address.").await);
        }
    };

    Ok(match AddressRepository::new(state.pool()).create(&input).await {
        Ok(address) => {
            tracing::info!(address_id = %address.id, "Address created");
            let location = format!("{INDEX}?highlight={}", address.id);
            write_done(&session, &headers, &location, "Address created successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e.into(), "Failed to create address.").await,
    })
}

/// Edit form.
#[instrument(skip(admin, session, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
) -> Result<AddressFormTemplate> {
    let address = find(&state, id).await?;
    let form = stored_values(&address);
    AddressFormTemplate::load(&state, admin, &session, form, Some(AddressResource::from(&address)))
        .await
}

/// Update an address.
#[instrument(skip(admin, session, state, headers, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
    form: FormData,
) -> Result<Response> {
    let existing = find(&state, id).await?;
    let back = format!("{INDEX}/{id}/edit");

    let input = match validate_address(&form, &ContactRepository::new(state.pool())).await {
        Ok(Ok(input)) => input,
        Ok(Err(errors)) => {
            let values = FormState::resubmitted(&form, FIELDS, errors.clone());
            let address = Some(AddressResource::from(&existing));
            let page = AddressFormTemplate::load(&state, admin, &session, values, address).await?;
            return Ok(invalid(&headers, &errors, page));
        }
        Err(e) => {
            return Ok(write_failed(&session, &headers, &back, e.into(), "Failed to update address.").await);
        }
    };

    Ok(match AddressRepository::new(state.pool()).update(id, &input).await {
        Ok(address) => {
            tracing::info!(address_id = %address.id, "Address updated");
            let location = format!("{INDEX}?highlight={}", address.id);
            write_done(&session, &headers, &location, "Address updated successfully.".to_string()).await
        }
        Err(e) => write_failed(&session, &headers, &back, e.into(), "Failed to update address.").await,
    })
}

/// Soft-delete an address.
#[instrument(skip(_admin, session, state, headers))]
pub async fn destroy(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let result = AddressRepository::new(state.pool()).delete(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore a soft-deleted address.
#[instrument(skip(_admin, session, state, headers))]
pub async fn restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let result = AddressRepository::new(state.pool()).restore(id).await;
    transition_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}

/// Soft-delete the selected addresses.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_delete(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = AddressRepository::new(state.pool()).bulk_delete(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Delete, result).await
}

/// Restore the selected addresses.
#[instrument(skip(_admin, session, state, headers))]
pub async fn bulk_restore(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    State(state): State<AppState>,
    headers: HeaderMap,
    BulkIds(ids): BulkIds,
) -> Response {
    let result = AddressRepository::new(state.pool()).bulk_restore(&ids).await;
    bulk_outcome(&session, &headers, INDEX, &NOUN, BulkVerb::Restore, result).await
}
