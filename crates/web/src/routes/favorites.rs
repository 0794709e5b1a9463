//! Favorite toggle handler.

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::instrument;

use tokoku_core::ItemId;

use crate::db::{FavoriteRepository, ItemRepository};
use crate::error::AppError;
use crate::middleware::RequireApiUser;
use crate::resources::FavoriteResponse;
use crate::state::AppState;

/// Flip the signed-in user's favorite on `item_id`.
///
/// Accepts `{"item_id": 12}` as JSON or `item_id=12` as a form. Guests get
/// a JSON 401 either way.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn toggle(
    RequireApiUser(user): RequireApiUser,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let Some(item_id) = item_id_from(request, &state).await else {
        return reply(StatusCode::UNPROCESSABLE_ENTITY, FavoriteResponse::missing_item());
    };

    match ItemRepository::new(state.pool()).is_active(item_id).await {
        Ok(true) => {}
        Ok(false) => return reply(StatusCode::NOT_FOUND, FavoriteResponse::item_not_found()),
        Err(e) => {
            AppError::from(e).report();
            return reply(StatusCode::INTERNAL_SERVER_ERROR, FavoriteResponse::failed());
        }
    }

    match FavoriteRepository::new(state.pool())
        .toggle(user.id, item_id)
        .await
    {
        Ok(outcome) => {
            tracing::info!(item_id = %item_id, status = ?outcome, "Favorite toggled");
            reply(StatusCode::OK, FavoriteResponse::toggled(outcome))
        }
        Err(e) => {
            AppError::from(e).report();
            reply(StatusCode::INTERNAL_SERVER_ERROR, FavoriteResponse::failed())
        }
    }
}

fn reply(status: StatusCode, body: FavoriteResponse) -> Response {
    (status, Json(body)).into_response()
}

async fn item_id_from(request: Request, state: &AppState) -> Option<ItemId> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let Json(body) = Json::<Value>::from_request(request, state).await.ok()?;
        parse_item_id(body.get("item_id")?)
    } else {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .ok()?;
        parse_item_id(&Value::String(fields.get("item_id")?.clone()))
    }
}

fn parse_item_id(value: &Value) -> Option<ItemId> {
    let id = match value {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id > 0).then(|| ItemId::new(id))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_item_id() {
        assert_eq!(parse_item_id(&json!(12)), Some(ItemId::new(12)));
        assert_eq!(parse_item_id(&json!(" 7 ")), Some(ItemId::new(7)));
        assert_eq!(parse_item_id(&json!("abc")), None);
        assert_eq!(parse_item_id(&json!(0)), None);
        assert_eq!(parse_item_id(&json!(null)), None);
        assert_eq!(parse_item_id(&json!(1.5)), None);
    }
}
