//! Favorite toggling against a real database.

use axum::http::StatusCode;
use serde_json::json;

use tokoku_core::UserRole;
use tokoku_integration_tests::{TestApp, TestRequest, body_json};

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_toggle_twice_restores_membership() {
    let app = TestApp::new().await;
    let user = app.create_user("hana", UserRole::Client).await;
    let cookie = app.sign_in(&user).await;
    let category = app.create_category("Buah").await;
    let item = app.create_item(&category, "Mangga", 30_000).await;
    let body = json!({ "item_id": item.id.as_i32() });

    let response = app
        .send(TestRequest::post("/favorites/toggle").cookie(&cookie).json(&body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "status": "added", "message": "Item added to favorites" })
    );

    let response = app
        .send(TestRequest::post("/favorites/toggle").cookie(&cookie).json(&body))
        .await;
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "status": "removed", "message": "Item removed from favorites" })
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_toggle_accepts_form_body() {
    let app = TestApp::new().await;
    let user = app.create_user("ivan", UserRole::Client).await;
    let cookie = app.sign_in(&user).await;
    let category = app.create_category("Sayur").await;
    let item = app.create_item(&category, "Sawi", 4_000).await;
    let id = item.id.to_string();

    let response = app
        .send(
            TestRequest::post("/favorites/toggle")
                .cookie(&cookie)
                .accept_json()
                .form(&[("item_id", &id)]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], json!("added"));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_toggle_rejects_bad_items() {
    let app = TestApp::new().await;
    let user = app.create_user("joko", UserRole::Client).await;
    let cookie = app.sign_in(&user).await;

    let response = app
        .send(
            TestRequest::post("/favorites/toggle")
                .cookie(&cookie)
                .json(&json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["success"], json!(false));

    let response = app
        .send(
            TestRequest::post("/favorites/toggle")
                .cookie(&cookie)
                .json(&json!({ "item_id": 2_147_483_000 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_catalog_flags_viewer_favorites() {
    let app = TestApp::new().await;
    let user = app.create_user("kiki", UserRole::Client).await;
    let cookie = app.sign_in(&user).await;
    let category = app.create_category("Minuman").await;
    let item = app.create_item(&category, &format!("Teh {}", app.token), 9_500).await;

    app.send(
        TestRequest::post("/favorites/toggle")
            .cookie(&cookie)
            .json(&json!({ "item_id": item.id.as_i32() })),
    )
    .await;

    let response = app
        .send(
            TestRequest::get(&format!("/?search={}", app.token))
                .cookie(&cookie)
                .accept_json()
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entry = &body["items"]["data"][0];
    assert_eq!(entry["id"], json!(item.id.as_i32()));
    assert_eq!(entry["is_favorite"], json!(true));
    assert_eq!(entry["favorites_count"], json!(1));

    let anonymous = app
        .send(
            TestRequest::get(&format!("/?search={}", app.token))
                .accept_json()
                .empty(),
        )
        .await;
    let body = body_json(anonymous).await;
    assert_eq!(body["items"]["data"][0]["is_favorite"], json!(false));
}
