//! Admin user management against a real database.
//!
//! Run with: `TEST_DATABASE_URL=... cargo test -p tokoku-integration-tests -- --ignored`

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use tokoku_core::UserRole;
use tokoku_integration_tests::{TestApp, TestRequest, body_json, location};
use tokoku_web::db::UserRepository;

fn usernames(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

async fn list(app: &TestApp, cookie: &str, query: &str) -> Value {
    let response = app
        .send(
            TestRequest::get(&format!("/admin/users?{query}"))
                .cookie(cookie)
                .accept_json()
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_search_is_case_insensitive_and_restricting() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let alice = app.create_user("alice", UserRole::Client).await;
    app.create_user("bob", UserRole::Courier).await;

    let page = list(&app, &cookie, &format!("search={}", alice.username.to_uppercase())).await;
    assert_eq!(usernames(&page), vec![alice.username.clone()]);

    let query = format!("search={}&sort_by=username&sort_order=asc", app.token);
    let page = list(&app, &cookie, &query).await;
    let names = usernames(&page);
    assert_eq!(names.len(), 3);
    assert!(names.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_role_filter() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let courier = app.create_user("courier", UserRole::Courier).await;
    app.create_user("client", UserRole::Client).await;

    let page = list(&app, &cookie, &format!("search={}&role=COURIER", app.token)).await;
    assert_eq!(usernames(&page), vec![courier.username]);

    // An unknown role value is ignored rather than rejected.
    let page = list(&app, &cookie, &format!("search={}&role=OWNER", app.token)).await;
    assert_eq!(usernames(&page).len(), 3);
}

// ============================================================================
// Soft delete
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_then_restore_returns_to_default_listing() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let carol = app.create_user("carol", UserRole::Client).await;
    let search = format!("search={}", carol.username);

    let response = app
        .send(
            TestRequest::new(Method::DELETE, &format!("/admin/users/{}", carol.id))
                .cookie(&cookie)
                .accept_json()
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "User deleted successfully." })
    );

    assert!(usernames(&list(&app, &cookie, &search).await).is_empty());
    let deleted = list(&app, &cookie, &format!("{search}&deleted_status=deleted")).await;
    assert_eq!(usernames(&deleted), vec![carol.username.clone()]);

    let response = app
        .send(
            TestRequest::post(&format!("/admin/users/{}/restore", carol.id))
                .cookie(&cookie)
                .header("referer", "http://localhost:3000/admin/users?deleted_status=deleted")
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin/users?deleted_status=deleted");

    assert_eq!(usernames(&list(&app, &cookie, &search).await), vec![carol.username]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_missing_user_is_not_found() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;

    let response = app
        .send(
            TestRequest::post("/admin/users/2147483000/delete")
                .cookie(&cookie)
                .accept_json()
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_bulk_delete_skips_unknown_ids() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let first = app.create_user("first", UserRole::Client).await;
    let second = app.create_user("second", UserRole::Client).await;

    let response = app
        .send(
            TestRequest::post("/admin/users/bulk-delete")
                .cookie(&cookie)
                .json(&json!({ "ids": [first.id.as_i32(), second.id.as_i32(), 2_147_483_000] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "count": 2, "message": "2 users deleted successfully." })
    );

    let response = app
        .send(
            TestRequest::post("/admin/users/bulk-restore")
                .cookie(&cookie)
                .json(&json!({ "ids": [first.id.as_i32().to_string()] })),
        )
        .await;
    assert_eq!(
        body_json(response).await["message"],
        json!("1 user restored successfully.")
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_bulk_delete_without_ids_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;

    let response = app
        .send(
            TestRequest::post("/admin/users/bulk-delete")
                .cookie(&cookie)
                .json(&json!({ "ids": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Create & update
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_password_mismatch_persists_nothing() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let username = format!("dave_{}", app.token);
    let email = format!("{username}@tokoku.test");

    let response = app
        .send(
            TestRequest::post("/admin/users")
                .cookie(&cookie)
                .accept_json()
                .form(&[
                    ("username", &username),
                    ("email", &email),
                    ("password", "secret123"),
                    ("password_confirmation", "secret124"),
                    ("role", "CLIENT"),
                    ("status", "active"),
                ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["errors"]["password"][0],
        json!("The password confirmation does not match.")
    );

    let taken = UserRepository::new(&app.pool)
        .username_taken(&username, None)
        .await
        .unwrap();
    assert!(!taken);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_create_user_redirects_with_highlight() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let username = format!("erin_{}", app.token);
    let email = format!("{username}@tokoku.test");

    let response = app
        .send(
            TestRequest::post("/admin/users").cookie(&cookie).form(&[
                ("username", &username),
                ("email", &email),
                ("password", "secret123"),
                ("password_confirmation", "secret123"),
                ("role", "CLIENT"),
                ("status", "active"),
            ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/admin/users?highlight="));

    // The same username again fails uniqueness.
    let response = app
        .send(
            TestRequest::post("/admin/users")
                .cookie(&cookie)
                .accept_json()
                .form(&[
                    ("username", &username),
                    ("email", &format!("other_{email}")),
                    ("password", "secret123"),
                    ("password_confirmation", "secret123"),
                    ("role", "CLIENT"),
                    ("status", "active"),
                ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["errors"]["username"].is_array());
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_non_admin_is_forbidden() {
    let app = TestApp::new().await;
    let client = app.create_user("frank", UserRole::Client).await;
    let cookie = app.sign_in(&client).await;

    let response = app
        .send(TestRequest::get("/admin/users").cookie(&cookie).empty())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_wrong_password_redirects_with_error() {
    let app = TestApp::new().await;
    let user = app.create_user("gina", UserRole::Admin).await;

    let response = app
        .send(
            TestRequest::post("/login")
                .header("x-forwarded-for", "203.0.113.20")
                .form(&[("email", user.email.as_str()), ("password", "wrong-password")]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=credentials");
}
