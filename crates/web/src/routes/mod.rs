//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Storefront
//! GET  /                       - Item search and popular items
//! POST /favorites/toggle       - Add or remove a favorite (JSON)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Password login (rate limited)
//! POST /logout                 - Logout
//!
//! # Admin (ADMIN role)
//! GET  /admin                  - Dashboard
//! /admin/users, /admin/contacts, /admin/addresses,
//! /admin/categories, /admin/items - see [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod favorites;
pub mod health;
pub mod home;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::login_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router. Only the login submission is rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .route("/favorites/toggle", post(favorites::toggle))
        .merge(auth_routes())
        .nest("/admin", admin::routes())
}
