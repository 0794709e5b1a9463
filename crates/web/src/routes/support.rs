//! Helpers shared by the route handlers: redirect-back, bulk id parsing,
//! outcome responses and form re-rendering state.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use url::Url;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{set_flash, wants_json};
use crate::models::FlashMessage;
use crate::requests::{FormData, ValidationErrors};

/// Redirect to the page the request came from (path and query only), or to
/// `fallback` when there is no usable `Referer`.
#[must_use]
pub fn redirect_back(headers: &HeaderMap, fallback: &str) -> Redirect {
    Redirect::to(&back_location(headers, fallback))
}

/// Path and query of the `Referer`, or `fallback`.
///
/// A path starting with `//` would redirect to another host, so it falls
/// back as well.
#[must_use]
pub fn back_location(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| Url::parse(referer).ok())
        .filter(|url| is_local_path(url.path()))
        .map_or_else(
            || fallback.to_string(),
            |url| match url.query() {
                Some(query) => format!("{}?{query}", url.path()),
                None => url.path().to_string(),
            },
        )
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

/// Singular and plural display names of a resource.
#[derive(Debug, Clone, Copy)]
pub struct Noun {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl Noun {
    /// `"1 user"`, `"3 users"`.
    #[must_use]
    pub fn count(&self, n: u64) -> String {
        let word = if n == 1 { self.singular } else { self.plural };
        format!("{n} {word}")
    }

    /// Capitalized singular, for messages such as "User created successfully."
    #[must_use]
    pub fn title(&self) -> String {
        let mut chars = self.singular.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

/// Bulk transition applied to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkVerb {
    Delete,
    Restore,
}

impl BulkVerb {
    const fn past(self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Restore => "restored",
        }
    }

    const fn present(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }
}

/// `"2 users deleted successfully."`
#[must_use]
pub fn bulk_message(noun: &Noun, verb: BulkVerb, count: u64) -> String {
    format!("{} {} successfully.", noun.count(count), verb.past())
}

/// Ids submitted to a bulk endpoint.
///
/// Accepts a JSON body `{"ids": [..]}` (numbers or numeric strings) or a form
/// field `ids` that is repeated and/or comma-separated. Values that are not
/// ids are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkIds(pub Vec<i32>);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct JsonIds {
    #[serde(default)]
    ids: Vec<JsonId>,
}

impl BulkIds {
    fn from_pieces<'a>(pieces: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ids: Vec<i32> = pieces
            .into_iter()
            .flat_map(|piece| piece.split(','))
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    fn from_json(body: JsonIds) -> Self {
        let mut ids: Vec<i32> = body
            .ids
            .into_iter()
            .filter_map(|id| match id {
                JsonId::Number(n) => i32::try_from(n).ok(),
                JsonId::Text(s) => s.trim().parse().ok(),
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }
}

impl<S> FromRequest<S> for BulkIds
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let ids = if is_json {
            let Json(body) = Json::<JsonIds>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Self::from_json(body)
        } else {
            let form = FormData::from_request(req, state).await?;
            let mut pieces = form.all("ids");
            pieces.extend(form.all("ids[]"));
            Self::from_pieces(pieces)
        };

        if ids.0.is_empty() {
            return Err(AppError::BadRequest("No records selected".to_string()));
        }
        Ok(ids)
    }
}

#[derive(Debug, Serialize)]
struct BulkBody {
    success: bool,
    count: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    success: bool,
    message: &'a str,
}

/// Respond to a finished bulk transition: JSON `{success, count, message}`,
/// or a flash and a redirect back to the listing.
pub async fn bulk_outcome(
    session: &Session,
    headers: &HeaderMap,
    fallback: &str,
    noun: &Noun,
    verb: BulkVerb,
    result: Result<u64, RepositoryError>,
) -> Response {
    match result {
        Ok(count) => {
            let message = bulk_message(noun, verb, count);
            tracing::info!(resource = noun.plural, action = verb.present(), count, "Bulk transition");
            if wants_json(headers) {
                return Json(BulkBody {
                    success: true,
                    count,
                    message,
                })
                .into_response();
            }
            set_flash(session, FlashMessage::success(message)).await;
            redirect_back(headers, fallback).into_response()
        }
        Err(e) => {
            let message = format!("Failed to {} {}.", verb.present(), noun.plural);
            write_failed(session, headers, fallback, e.into(), &message).await
        }
    }
}

/// Respond to a single-row delete or restore. A missing id is a 404; other
/// failures degrade to a flash message.
///
/// # Errors
///
/// Returns `AppError::NotFound` when the row does not exist.
pub async fn transition_outcome(
    session: &Session,
    headers: &HeaderMap,
    fallback: &str,
    noun: &Noun,
    verb: BulkVerb,
    result: Result<(), RepositoryError>,
) -> Result<Response, AppError> {
    match result {
        Ok(()) => {
            tracing::info!(resource = noun.singular, action = verb.present(), "Record transition");
            let message = format!("{} {} successfully.", noun.title(), verb.past());
            let location = back_location(headers, fallback);
            Ok(write_done(session, headers, &location, message).await)
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("{} not found", noun.singular))),
        Err(e) => {
            let message = format!("Failed to {} {}.", verb.present(), noun.singular);
            Ok(write_failed(session, headers, fallback, e.into(), &message).await)
        }
    }
}

/// Respond to a successful write: JSON `{success, message}`, or a flash and
/// a redirect to `location`.
pub async fn write_done(
    session: &Session,
    headers: &HeaderMap,
    location: &str,
    message: String,
) -> Response {
    if wants_json(headers) {
        return Json(MessageBody {
            success: true,
            message: &message,
        })
        .into_response();
    }
    set_flash(session, FlashMessage::success(message)).await;
    Redirect::to(location).into_response()
}

/// Report an unexpected write failure and show `message` instead of the
/// internal error.
pub async fn write_failed(
    session: &Session,
    headers: &HeaderMap,
    fallback: &str,
    error: AppError,
    message: &str,
) -> Response {
    error.report();
    if wants_json(headers) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageBody {
                success: false,
                message,
            }),
        )
            .into_response();
    }
    set_flash(session, FlashMessage::error(message)).await;
    redirect_back(headers, fallback).into_response()
}

/// Respond to a validation failure: 422 with the errors as JSON, or the
/// re-rendered form.
pub fn invalid(headers: &HeaderMap, errors: &ValidationErrors, page: impl IntoResponse) -> Response {
    if wants_json(headers) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "success": false,
                "message": "The given data was invalid.",
                "errors": errors,
            })),
        )
            .into_response();
    }
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}

/// Values and errors shown in a create/edit form.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: HashMap<String, String>,
    errors: ValidationErrors,
}

impl FormState {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled with stored values.
    #[must_use]
    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            errors: ValidationErrors::new(),
        }
    }

    /// The submitted values with their errors. Passwords are not echoed.
    #[must_use]
    pub fn resubmitted(form: &FormData, fields: &[&str], errors: ValidationErrors) -> Self {
        Self {
            values: fields
                .iter()
                .filter(|f| !f.starts_with("password"))
                .map(|f| ((*f).to_string(), form.old(f).to_string()))
                .collect(),
            errors,
        }
    }

    /// Set a value unless one is already present.
    #[must_use]
    pub fn default_value(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values
            .entry(field.to_string())
            .or_insert_with(|| value.into());
        self
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    #[must_use]
    pub fn is_selected(&self, field: &str, option: &str) -> bool {
        self.value(field) == option
    }

    /// Checkbox state.
    #[must_use]
    pub fn is_checked(&self, field: &str) -> bool {
        matches!(self.value(field), "1" | "true" | "on")
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.first(field)
    }

    #[must_use]
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const USERS: Noun = Noun {
        singular: "user",
        plural: "users",
    };

    #[test]
    fn test_bulk_message_counts() {
        assert_eq!(
            bulk_message(&USERS, BulkVerb::Delete, 2),
            "2 users deleted successfully."
        );
        assert_eq!(
            bulk_message(&USERS, BulkVerb::Restore, 1),
            "1 user restored successfully."
        );
        assert_eq!(USERS.title(), "User");
    }

    #[test]
    fn test_ids_from_form_pieces() {
        let ids = BulkIds::from_pieces(["1,2, 3", "3", "abc", "7"]);
        assert_eq!(ids.0, vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_ids_from_json_mixed_values() {
        let body: JsonIds = serde_json::from_str(r#"{"ids":[1,"2",999,"x",99999999999]}"#).unwrap();
        assert_eq!(BulkIds::from_json(body).0, vec![1, 2, 999]);
    }

    #[test]
    fn test_redirect_back_uses_referer_path() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://evil.example/admin/users?page=2&search=budi"),
        );
        let response = redirect_back(&headers, "/admin/users").into_response();
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin/users?page=2&search=budi"
        );

        let response = redirect_back(&HeaderMap::new(), "/admin/users").into_response();
        assert_eq!(response.headers()[header::LOCATION], "/admin/users");
    }

    #[test]
    fn test_redirect_back_rejects_protocol_relative_path() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://evil.example//evil.example/phish"),
        );
        let location = back_location(&headers, "/admin/items");
        assert_eq!(location, "/admin/items");

        let response = redirect_back(&headers, "/admin/items").into_response();
        assert_eq!(response.headers()[header::LOCATION], "/admin/items");
    }

    #[test]
    fn test_resubmitted_form_drops_passwords() {
        let data = FormData::from_pairs(vec![
            ("username".to_string(), "budi".to_string()),
            ("password".to_string(), "secret".to_string()),
        ]);
        let mut errors = ValidationErrors::new();
        errors.add("password", "The password confirmation does not match.");

        let state = FormState::resubmitted(&data, &["username", "password"], errors);
        assert_eq!(state.value("username"), "budi");
        assert_eq!(state.value("password"), "");
        assert_eq!(
            state.error("password"),
            Some("The password confirmation does not match.")
        );
        assert!(state.has_errors());
    }

    #[test]
    fn test_default_value_keeps_existing() {
        let state = FormState::with_values([("role", "ADMIN")])
            .default_value("role", "CLIENT")
            .default_value("status", "active");
        assert!(state.is_selected("role", "ADMIN"));
        assert_eq!(state.value("status"), "active");
    }
}
