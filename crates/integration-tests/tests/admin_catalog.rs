//! Admin catalog and contact management against a real database.

use axum::http::StatusCode;
use serde_json::{Value, json};

use tokoku_core::{Gender, UserRole};
use tokoku_integration_tests::{TestApp, TestRequest, body_json, body_text, location};
use tokoku_web::db::ContactRepository;
use tokoku_web::models::ContactInput;

fn names(page: &Value) -> Vec<&str> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect()
}

async fn get_json(app: &TestApp, cookie: &str, uri: &str) -> Value {
    let response = app
        .send(TestRequest::get(uri).cookie(cookie).accept_json().empty())
        .await;
    assert_eq!(response.status(), StatusCode::OK, "{uri}");
    body_json(response).await
}

// ============================================================================
// Search across relations
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_item_search_matches_category_name() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let spices = app.create_category("Rempah").await;
    let fruit = app.create_category("Buah").await;
    app.create_item(&spices, "Jahe", 18_000).await;
    app.create_item(&fruit, "Pepaya", 12_000).await;

    let uri = format!("/admin/items?search=rempah%20{}", app.token);
    let page = get_json(&app, &cookie, &uri).await;
    assert_eq!(names(&page), vec!["Jahe"]);
    assert_eq!(page["data"][0]["category"]["name"], json!(spices.name));

    let uri = format!("/admin/items?category_id={}&search=pepaya", fruit.id);
    assert_eq!(names(&get_json(&app, &cookie, &uri).await), vec!["Pepaya"]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_contact_search_matches_owner() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let owner = app.create_user("lina", UserRole::Client).await;
    ContactRepository::new(&app.pool)
        .create(&ContactInput {
            user_id: owner.id,
            name: "Kantor Pusat".to_string(),
            phone: "0812000111".to_string(),
            profile: None,
            gender: Gender::Woman,
            birthday: None,
        })
        .await
        .unwrap();

    let uri = format!("/admin/contacts?search={}", owner.username.to_uppercase());
    let page = get_json(&app, &cookie, &uri).await;
    assert_eq!(names(&page), vec!["Kantor Pusat"]);
    assert_eq!(page["data"][0]["user"]["username"], json!(owner.username));
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_show_lists_items() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let category = app.create_category("Beras").await;
    app.create_item(&category, "Beras Pandan Wangi", 75_000).await;

    let body = get_json(&app, &cookie, &format!("/admin/categories/{}", category.id)).await;
    assert_eq!(body["slug"], json!(category.slug));
    assert_eq!(body["items"][0]["name"], json!("Beras Pandan Wangi"));

    let response = app
        .send(
            TestRequest::get(&format!("/admin/categories/{}", category.id))
                .cookie(&cookie)
                .empty(),
        )
        .await;
    let html = body_text(response).await;
    assert!(html.contains("Beras Pandan Wangi"));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_create_derives_slug() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let name = format!("Bumbu Dapur {}", app.token);

    let response = app
        .send(
            TestRequest::post("/admin/categories")
                .cookie(&cookie)
                .form(&[("name", &name), ("description", "Bumbu **pilihan**")]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/admin/categories?highlight="));

    let uri = format!("/admin/categories?search={}", app.token);
    let page = get_json(&app, &cookie, &uri).await;
    assert_eq!(page["data"][0]["slug"], json!(format!("bumbu-dapur-{}", app.token)));
}

// ============================================================================
// Items
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_item_validation_errors() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;

    let response = app
        .send(
            TestRequest::post("/admin/items")
                .cookie(&cookie)
                .accept_json()
                .form(&[
                    ("category_id", "2147483000"),
                    ("name", "Gula"),
                    ("unit", "kg"),
                    ("price", "-5"),
                    ("stock", "3"),
                    ("discount", "150"),
                ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = &body_json(response).await["errors"];
    assert_eq!(errors["category_id"][0], json!("The selected category is invalid."));
    assert_eq!(errors["price"][0], json!("The price must be at least 0."));
    assert_eq!(errors["discount"][0], json!("The discount must be between 0 and 100."));
    assert!(errors.get("name").is_none());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_item_create_form_preselects_category() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let category = app.create_category("Telur").await;

    let response = app
        .send(
            TestRequest::get(&format!("/admin/items/create?category={}", category.id))
                .cookie(&cookie)
                .empty(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(&format!(r#"<option value="{}" selected>"#, category.id)));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_item_update_keeps_category() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let category = app.create_category("Susu").await;
    let item = app.create_item(&category, "Susu UHT", 6_500).await;
    let category_id = category.id.to_string();

    let response = app
        .send(
            TestRequest::post(&format!("/admin/items/{}", item.id))
                .cookie(&cookie)
                .accept_json()
                .form(&[
                    ("category_id", &category_id),
                    ("name", "Susu UHT Coklat"),
                    ("unit", "kotak"),
                    ("price", "7000"),
                    ("stock", "12"),
                    ("is_available", "1"),
                    ("discount", "10"),
                ]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], json!(true));

    let uri = format!("/admin/items?category_id={}", category.id);
    let page = get_json(&app, &cookie, &uri).await;
    let row = &page["data"][0];
    assert_eq!(row["name"], json!("Susu UHT Coklat"));
    assert_eq!(row["discount"], json!(10));
    assert_eq!(row["final_price_display"], json!("Rp 6.300"));
}

// ============================================================================
// Bulk delete & restore on items
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_item_bulk_delete_then_restore() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;
    let category = app.create_category("Sayur").await;
    let bayam = app.create_item(&category, "Bayam", 5_000).await;
    let kangkung = app.create_item(&category, "Kangkung", 4_000).await;

    let response = app
        .send(
            TestRequest::post("/admin/items/bulk-delete")
                .cookie(&cookie)
                .json(&json!({ "ids": [bayam.id.as_i32(), kangkung.id.as_i32(), 2_147_483_000] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "count": 2, "message": "2 items deleted successfully." })
    );

    let active = format!("/admin/items?category_id={}", category.id);
    assert!(names(&get_json(&app, &cookie, &active).await).is_empty());

    let deleted = format!("/admin/items?category_id={}&deleted_status=deleted", category.id);
    let mut gone = names(&get_json(&app, &cookie, &deleted).await)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    gone.sort();
    assert_eq!(gone, vec!["Bayam", "Kangkung"]);

    let response = app
        .send(
            TestRequest::post("/admin/items/bulk-restore")
                .cookie(&cookie)
                .json(&json!({ "ids": [bayam.id.as_i32()] })),
        )
        .await;
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "count": 1, "message": "1 item restored successfully." })
    );
    assert_eq!(names(&get_json(&app, &cookie, &active).await), vec!["Bayam"]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_dashboard_lists_every_resource() {
    let app = TestApp::new().await;
    let cookie = app.admin_session().await;

    let response = app
        .send(TestRequest::get("/admin").cookie(&cookie).empty())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    for href in [
        "/admin/users",
        "/admin/contacts",
        "/admin/addresses",
        "/admin/categories",
        "/admin/items",
    ] {
        assert!(body.contains(&format!("{href}?deleted_status=deleted")), "{href}");
    }
}
