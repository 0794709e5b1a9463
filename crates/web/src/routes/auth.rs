//! Authentication route handlers.
//!
//! Email and password sign-in backed by the `users` table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user, set_flash, take_flash};
use crate::models::{CurrentUser, FlashMessage};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub flash: Option<FlashMessage>,
}

/// Message shown for a `?error=` code.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "credentials" => Some("These credentials do not match our records."),
        "disabled" => Some("This account is inactive. Please contact an administrator."),
        "session" => Some("Could not start your session. Please try again."),
        _ => None,
    }
}

/// Where a user lands after signing in.
const fn home_for(user: &CurrentUser) -> &'static str {
    if matches!(user.role, tokoku_core::UserRole::Admin) {
        "/admin"
    } else {
        "/"
    }
}

/// Display the login page.
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Response {
    if let Some(user) = user {
        return Redirect::to(home_for(&user)).into_response();
    }
    LoginTemplate {
        error: query.error.as_deref().and_then(error_message),
        flash: take_flash(&session).await,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let user = match AuthService::new(state.pool())
        .login_with_password(form.email.trim(), &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::AccountDisabled) => {
            tracing::warn!("Login refused for disabled account");
            return Redirect::to("/login?error=disabled").into_response();
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::warn!("Login failed: invalid credentials");
            return Redirect::to("/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            return Redirect::to("/login?error=session").into_response();
        }
    };

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role,
    };

    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/login?error=session").into_response();
    }

    set_sentry_user(current.id.as_i32(), Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, role = %current.role, "User signed in");
    Redirect::to(home_for(&current)).into_response()
}

/// Handle logout.
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    set_flash(&session, FlashMessage::success("You have been signed out.")).await;
    Redirect::to("/login")
}

#[cfg(test)]
mod tests {
    use tokoku_core::{Email, UserId, UserRole};

    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_message("credentials"),
            Some("These credentials do not match our records.")
        );
        assert!(error_message("disabled").is_some());
        assert_eq!(error_message("<script>"), None);
    }

    #[test]
    fn test_landing_page_by_role() {
        let Ok(email) = Email::parse("siti@example.com") else {
            panic!("valid email");
        };
        let mut user = CurrentUser {
            id: UserId::new(1),
            username: "siti".to_string(),
            email,
            role: UserRole::Admin,
        };
        assert_eq!(home_for(&user), "/admin");
        user.role = UserRole::Client;
        assert_eq!(home_for(&user), "/");
    }
}
