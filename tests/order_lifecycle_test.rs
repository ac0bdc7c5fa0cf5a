//! End-to-end tests for the order lifecycle.
//!
//! Tests cover the full journey:
//! - Order creation with price snapshotting and table occupancy
//! - Full line replacement while the order is open
//! - Kitchen status updates
//! - Closing the order: bill issuance, paid status, table release
//! - Rejection paths: missing rows, busy tables, paid orders

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

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("decimal fields serialize as strings")
        .parse()
        .expect("decimal parse")
}

// ==================== Full Lifecycle ====================

#[tokio::test]
async fn order_to_bill_flow_releases_table() {
    let app = TestApp::new().await;

    let paneer = app
        .seed_menu_item("Paneer Tikka", "449.00", "Starters")
        .await;
    let naan = app.seed_menu_item("Butter Naan", "70.00", "Breads").await;
    let table = app.seed_table(3).await;

    // Step 1: open the order
    let order = app
        .place_order(
            table,
            json!([
                { "menu_item_id": paneer, "quantity": 1 },
                { "menu_item_id": naan, "quantity": 2 },
            ]),
        )
        .await;
    let order_id = order["id"].as_i64().expect("order id");
    assert_eq!(order["status"], "pending");
    assert_eq!(decimal(&order["total_amount"]), dec!(589.00));
    assert_eq!(order["lines"].as_array().expect("lines array").len(), 2);

    // Step 2: the table is now occupied by exactly this order
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/tables/{}", table), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "occupied");
    assert_eq!(fetched["data"]["current_order_id"].as_i64(), Some(order_id));

    // Step 3: close the order with 5% tax
    let close = app
        .request(
            Method::POST,
            "/api/v1/bills",
            Some(json!({ "order_id": order_id, "tax_rate": "0.05" })),
        )
        .await;
    assert_eq!(close.status(), 201);
    let closed = response_json(close).await;
    assert_eq!(closed["data"]["newly_issued"], true);

    let bill = &closed["data"]["bill"];
    assert_eq!(decimal(&bill["subtotal"]), dec!(589.00));
    assert_eq!(decimal(&bill["tax_rate"]), dec!(0.05));
    assert_eq!(decimal(&bill["tax_amount"]), dec!(29.45));
    assert_eq!(decimal(&bill["total"]), dec!(618.45));
    assert!(bill["invoice_number"].as_i64().expect("invoice number") >= 1);
    assert_eq!(bill["restaurant_name"], "KHAN SAHAB RESTAURANT");

    // Step 4: the order is paid and carries the billed totals
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "paid");
    assert_eq!(decimal(&fetched["data"]["tax_amount"]), dec!(29.45));
    assert_eq!(decimal(&fetched["data"]["final_total"]), dec!(618.45));

    // Step 5: the table is free again
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/tables/{}", table), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "available");
    assert!(fetched["data"]["current_order_id"].is_null());
}

#[tokio::test]
async fn kitchen_status_updates_apply_in_sequence() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Dal Makhani", "249.00", "Mains").await;
    let table = app.seed_table(1).await;
    let order = app
        .place_order(table, json!([{ "menu_item_id": item, "quantity": 1 }]))
        .await;
    let order_id = order["id"].as_i64().expect("order id");

    for status in ["preparing", "ready", "served"] {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/orders/{}/status", order_id),
                Some(json!({ "status": status })),
            )
            .await;
        assert_eq!(response.status(), 200, "status update to {}", status);
        let body = response_json(response).await;
        assert_eq!(body["data"]["status"], status);
    }
}

#[tokio::test]
async fn status_update_stores_caller_tax_figures_verbatim() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Jeera Rice", "149.00", "Rice").await;
    let table = app.seed_table(1).await;
    let order = app
        .place_order(table, json!([{ "menu_item_id": item, "quantity": 2 }]))
        .await;
    let order_id = order["id"].as_i64().expect("order id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({
                "status": "served",
                "tax_rate": "0.05",
                "tax_amount": "14.90",
                "final_total": "312.90",
                "payment_method": "card",
            })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["tax_rate"]), dec!(0.05));
    assert_eq!(decimal(&body["data"]["tax_amount"]), dec!(14.90));
    assert_eq!(decimal(&body["data"]["final_total"]), dec!(312.90));
    assert_eq!(body["data"]["payment_method"], "card");
}

// ==================== Line Replacement ====================

#[tokio::test]
async fn replace_lines_is_a_full_replacement() {
    let app = TestApp::new().await;

    let pizza = app
        .seed_menu_item("Margherita Pizza", "299.00", "Pizza")
        .await;
    let salad = app.seed_menu_item("Caesar Salad", "199.00", "Salads").await;
    let coffee = app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let table = app.seed_table(5).await;

    let order = app
        .place_order(
            table,
            json!([
                { "menu_item_id": pizza, "quantity": 1 },
                { "menu_item_id": salad, "quantity": 1 },
            ]),
        )
        .await;
    let order_id = order["id"].as_i64().expect("order id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}", order_id),
            Some(json!({ "lines": [{ "menu_item_id": coffee, "quantity": 3 }] })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;

    let lines = body["data"]["lines"].as_array().expect("lines array");
    assert_eq!(lines.len(), 1, "old lines must be gone");
    assert_eq!(lines[0]["menu_item_id"].as_i64(), Some(coffee));
    assert_eq!(lines[0]["quantity"], 3);
    assert_eq!(decimal(&lines[0]["line_total"]), dec!(117.00));
    assert_eq!(decimal(&body["data"]["total_amount"]), dec!(117.00));

    // A fresh read agrees with the replace response
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
            .await,
    )
    .await;
    assert_eq!(
        fetched["data"]["lines"].as_array().expect("lines").len(),
        1
    );
    assert_eq!(decimal(&fetched["data"]["total_amount"]), dec!(117.00));
}

#[tokio::test]
async fn replace_lines_on_paid_order_conflicts() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Iced Tea", "49.00", "Beverages").await;
    let table = app.seed_table(2).await;
    let order = app
        .place_order(table, json!([{ "menu_item_id": item, "quantity": 1 }]))
        .await;
    let order_id = order["id"].as_i64().expect("order id");

    let close = app
        .request(
            Method::POST,
            "/api/v1/bills",
            Some(json!({ "order_id": order_id, "tax_rate": "0.05" })),
        )
        .await;
    assert_eq!(close.status(), 201);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}", order_id),
            Some(json!({ "lines": [{ "menu_item_id": item, "quantity": 5 }] })),
        )
        .await;
    assert_eq!(response.status(), 409);

    let status_update = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({ "status": "served" })),
        )
        .await;
    assert_eq!(status_update.status(), 409);
}

// ==================== Rejection Paths ====================

#[tokio::test]
async fn order_on_unknown_table_is_not_found() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "table_id": 999,
                "lines": [{ "menu_item_id": item, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn order_on_occupied_table_is_rejected() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let table = app.seed_table(7).await;
    app.place_order(table, json!([{ "menu_item_id": item, "quantity": 1 }]))
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "table_id": table,
                "lines": [{ "menu_item_id": item, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);

    // The rejected attempt must not leave a second order behind
    let orders = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(orders["data"].as_array().expect("orders").len(), 1);
}

#[tokio::test]
async fn order_with_unknown_menu_item_is_not_found() {
    let app = TestApp::new().await;
    let table = app.seed_table(4).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "table_id": table,
                "lines": [{ "menu_item_id": 12345, "quantity": 1 }],
            })),
        )
        .await;
    assert_eq!(response.status(), 404);

    // Validation failed before any write: the table stays free
    let fetched = response_json(
        app.request(Method::GET, &format!("/api/v1/tables/{}", table), None)
            .await,
    )
    .await;
    assert_eq!(fetched["data"]["status"], "available");
}

#[tokio::test]
async fn order_with_bad_quantity_is_rejected() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let table = app.seed_table(6).await;

    for quantity in [0, -2] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "table_id": table,
                    "lines": [{ "menu_item_id": item, "quantity": quantity }],
                })),
            )
            .await;
        assert_eq!(response.status(), 400, "quantity {}", quantity);
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "table_id": table, "lines": [] })),
        )
        .await;
    assert_eq!(response.status(), 400, "empty line set");
}

#[tokio::test]
async fn paid_is_not_a_kitchen_status() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let table = app.seed_table(8).await;
    let order = app
        .place_order(table, json!([{ "menu_item_id": item, "quantity": 1 }]))
        .await;
    let order_id = order["id"].as_i64().expect("order id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({ "status": "paid" })),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({ "status": "delivered" })),
        )
        .await;
    assert_eq!(response.status(), 400, "unknown status string");
}

#[tokio::test]
async fn missing_order_paths_return_not_found() {
    let app = TestApp::new().await;
    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;

    let get = app.request(Method::GET, "/api/v1/orders/777", None).await;
    assert_eq!(get.status(), 404);

    let replace = app
        .request(
            Method::PUT,
            "/api/v1/orders/777",
            Some(json!({ "lines": [{ "menu_item_id": item, "quantity": 1 }] })),
        )
        .await;
    assert_eq!(replace.status(), 404);

    let status = app
        .request(
            Method::PUT,
            "/api/v1/orders/777/status",
            Some(json!({ "status": "ready" })),
        )
        .await;
    assert_eq!(status.status(), 404);
}

// ==================== Listing ====================

#[tokio::test]
async fn order_listing_filters_by_status() {
    let app = TestApp::new().await;

    let item = app.seed_menu_item("Coffee", "39.00", "Beverages").await;
    let table_a = app.seed_table(1).await;
    let table_b = app.seed_table(2).await;

    let first = app
        .place_order(table_a, json!([{ "menu_item_id": item, "quantity": 1 }]))
        .await;
    app.place_order(table_b, json!([{ "menu_item_id": item, "quantity": 2 }]))
        .await;

    let first_id = first["id"].as_i64().expect("order id");
    let update = app
        .request(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", first_id),
            Some(json!({ "status": "preparing" })),
        )
        .await;
    assert_eq!(update.status(), 200);

    let all = response_json(app.request(Method::GET, "/api/v1/orders", None).await).await;
    assert_eq!(all["data"].as_array().expect("orders").len(), 2);

    let preparing = response_json(
        app.request(Method::GET, "/api/v1/orders?status=preparing", None)
            .await,
    )
    .await;
    let preparing = preparing["data"].as_array().expect("orders");
    assert_eq!(preparing.len(), 1);
    assert_eq!(preparing[0]["id"].as_i64(), Some(first_id));
    assert_eq!(
        preparing[0]["lines"].as_array().expect("lines").len(),
        1,
        "filtered listing carries lines"
    );

    let bogus = app
        .request(Method::GET, "/api/v1/orders?status=bogus", None)
        .await;
    assert_eq!(bogus.status(), 400);
}
