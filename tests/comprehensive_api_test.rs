//! Surface tests for the HTTP API: health, status, documentation, menu
//! catalog, and dining tables, including the error envelope.

mod common;

use axum::{body, http::Method, response::Response};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

// ==================== Service Endpoints ====================

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn status_endpoint_identifies_the_service() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["service"], "restaurant-pos-api");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/openapi.json", None).await;
    assert_eq!(response.status(), 200);
    let doc = response_json(response).await;
    assert!(doc["openapi"].as_str().is_some());
    assert!(doc["paths"]["/api/v1/orders"].is_object());
    assert!(doc["paths"]["/api/v1/bills/{id}/print"].is_object());
}

#[tokio::test]
async fn responses_carry_request_metadata() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/menu", None).await;
    assert_eq!(response.status(), 200);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");

    let body = response_json(response).await;
    assert_eq!(body["meta"]["request_id"].as_str(), Some(request_id.as_str()));
}

#[tokio::test]
async fn errors_use_the_shared_envelope() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/menu/4040", None).await;
    assert_eq!(response.status(), 404);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Not found: Menu item with id 4040 not found");
    assert!(body["request_id"].as_str().is_some());
    assert!(body["timestamp"].as_str().is_some());
}

// ==================== Menu Catalog ====================

#[tokio::test]
async fn menu_listing_excludes_unavailable_items() {
    let app = TestApp::new().await;

    app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let off_menu = response_json(
        app.request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({
                "name": "Seasonal Mango Shake",
                "price": "129.00",
                "category": "Beverages",
                "available": false,
            })),
        )
        .await,
    )
    .await;
    let off_menu_id = off_menu["data"]["id"].as_i64().expect("menu item id");

    let listed = response_json(app.request(Method::GET, "/api/v1/menu", None).await).await;
    let items = listed["data"].as_array().expect("menu items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Coffee");

    // Direct lookup still resolves so old order lines can render
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/menu/{}", off_menu_id), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["name"], "Seasonal Mango Shake");
    assert_eq!(fetched["data"]["available"], false);
}

#[tokio::test]
async fn menu_listing_filters_by_category() {
    let app = TestApp::new().await;

    app.seed_menu_item("Margherita Pizza", "299.00", "Pizza").await;
    app.seed_menu_item("Pepperoni Pizza", "399.00", "Pizza").await;
    app.seed_menu_item("Coffee", "39.00", "Beverages").await;

    let listed = response_json(
        app.request(Method::GET, "/api/v1/menu?category=Pizza", None)
            .await,
    )
    .await;
    let items = listed["data"].as_array().expect("menu items");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["category"] == "Pizza"));
}

#[tokio::test]
async fn menu_item_validation_rejects_bad_values() {
    let app = TestApp::new().await;

    let negative_price = app
        .request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({ "name": "Oops", "price": "-1.00", "category": "Test" })),
        )
        .await;
    assert_eq!(negative_price.status(), 400);

    let empty_name = app
        .request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({ "name": "", "price": "10.00", "category": "Test" })),
        )
        .await;
    assert_eq!(empty_name.status(), 400);

    // Zero is a legal price (complimentary items)
    let free_item = app
        .request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({ "name": "Complimentary Papad", "price": "0.00", "category": "Sides" })),
        )
        .await;
    assert_eq!(free_item.status(), 201);
}

#[tokio::test]
async fn unavailable_items_can_still_be_ordered_by_id() {
    let app = TestApp::new().await;

    let created = response_json(
        app.request(
            Method::POST,
            "/api/v1/menu",
            Some(json!({
                "name": "Old Special",
                "price": "199.00",
                "category": "Specials",
                "available": false,
            })),
        )
        .await,
    )
    .await;
    let item_id = created["data"]["id"].as_i64().expect("menu item id");
    let table = app.seed_table(1).await;

    let order = app
        .place_order(table, json!([{ "menu_item_id": item_id, "quantity": 1 }]))
        .await;
    let line = &order["lines"][0];
    assert_eq!(line["name"], "Old Special");
    assert_eq!(
        line["unit_price"].as_str().map(|s| s.parse::<Decimal>().expect("price")),
        Some(dec!(199.00))
    );
}

// ==================== Dining Tables ====================

#[tokio::test]
async fn tables_list_in_number_order_with_default_capacity() {
    let app = TestApp::new().await;

    app.seed_table(3).await;
    app.seed_table(1).await;
    let created = response_json(
        app.request(
            Method::POST,
            "/api/v1/tables",
            Some(json!({ "number": 2, "capacity": 6 })),
        )
        .await,
    )
    .await;
    assert_eq!(created["data"]["capacity"], 6);

    let listed = response_json(app.request(Method::GET, "/api/v1/tables", None).await).await;
    let tables = listed["data"].as_array().expect("tables");
    let numbers: Vec<i64> = tables
        .iter()
        .map(|t| t["number"].as_i64().expect("number"))
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(tables
        .iter()
        .all(|t| t["status"] == "available" && t["current_order_id"].is_null()));
    assert_eq!(tables[0]["capacity"], 4, "capacity defaults when omitted");
}

#[tokio::test]
async fn duplicate_table_numbers_are_rejected() {
    let app = TestApp::new().await;

    app.seed_table(9).await;
    let duplicate = app
        .request(Method::POST, "/api/v1/tables", Some(json!({ "number": 9 })))
        .await;
    assert_eq!(duplicate.status(), 400);
    let body = response_json(duplicate).await;
    assert_eq!(body["message"], "Invalid input: Table number 9 already exists");
}

#[tokio::test]
async fn table_validation_rejects_bad_values() {
    let app = TestApp::new().await;

    let bad_number = app
        .request(Method::POST, "/api/v1/tables", Some(json!({ "number": 0 })))
        .await;
    assert_eq!(bad_number.status(), 400);

    let bad_capacity = app
        .request(
            Method::POST,
            "/api/v1/tables",
            Some(json!({ "number": 1, "capacity": 0 })),
        )
        .await;
    assert_eq!(bad_capacity.status(), 400);

    let missing = app.request(Method::GET, "/api/v1/tables/999", None).await;
    assert_eq!(missing.status(), 404);
}
