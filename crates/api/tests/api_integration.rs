//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{MemoryStore, NewItem, RetailStore};
use tower::ServiceExt;

use api::AppState;
use api::config::Config;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<AppState<MemoryStore>>) {
    let store = MemoryStore::new();
    let state = api::create_state(store, &Config::default());
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn seed_item(
    state: &AppState<MemoryStore>,
    name: &str,
    quantity: i64,
    selling_cents: i64,
) -> i64 {
    state
        .store
        .insert_item(NewItem {
            name: name.to_string(),
            quantity,
            buying_price: common::Money::from_cents(selling_cents / 2),
            selling_price: common::Money::from_cents(selling_cents),
            barcode: None,
            supplier_id: None,
        })
        .await
        .unwrap()
        .id
        .as_i64()
}

async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send(app: &axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();
    let (status, json) = send(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "retail-backoffice-api");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_record_sale_happy_path() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 5, 10_000).await;

    let (status, json) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({
            "payment_method": "mpesa",
            "customer_name": "Wanjiku",
            "items": [{ "item_id": a, "quantity_sold": 5 }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["transaction_id"].as_str().is_some());
    assert_eq!(json["payment_method"], "mpesa");
    assert_eq!(json["customer_name"], "Wanjiku");
    assert_eq!(json["transactions"][0]["item_name"], "Atlas");
    assert_eq!(json["transactions"][0]["quantity_sold"], 5);
    assert_eq!(json["transactions"][0]["total_price"], 500.0);

    let item = state
        .store
        .get_item(common::ItemId::new(a))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 0);
}

#[tokio::test]
async fn test_sale_defaults_payment_and_customer() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 5, 100).await;

    let (status, json) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 1 }] }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["payment_method"], "cash");
    assert_eq!(json["customer_name"], "N/A");
}

#[tokio::test]
async fn test_insufficient_stock_returns_400_and_changes_nothing() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 5, 10_000).await;

    // Drain the stock, then try again.
    let (status, _) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 5 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 1 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Not enough stock"));

    let item = state
        .store
        .get_item(common::ItemId::new(a))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 0);
    assert_eq!(state.store.group_count().await, 1);
}

#[tokio::test]
async fn test_unknown_item_returns_404_without_partial_effects() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 100).await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [
            { "item_id": a, "quantity_sold": 2 },
            { "item_id": 999, "quantity_sold": 1 }
        ]}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let item = state
        .store
        .get_item(common::ItemId::new(a))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 10);
    assert_eq!(state.store.group_count().await, 0);
}

#[tokio::test]
async fn test_empty_and_malformed_sales_return_400() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 100).await;

    let (status, _) = send_json(&app, "POST", "/transactions", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 0 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Incomplete line entries are caller errors too, not decode rejections.
    let (status, json) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "quantity_sold": 1 }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("item_id"));

    let (status, _) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_receipts_with_date_filter() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 50, 100).await;

    for _ in 0..3 {
        let (status, _) = send_json(
            &app,
            "POST",
            "/transactions",
            serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 1 }] }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, "GET", "/transactions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);

    // All receipts were created just now, so today's filter returns them
    // all and a far-off day returns none.
    let today = chrono::Utc::now().format("%Y-%m-%d");
    let (status, json) = send(&app, "GET", &format!("/transactions?date={today}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (status, json) = send(&app, "GET", "/transactions?date=2000-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_date_filter_returns_400() {
    let (app, _) = setup();
    let (status, json) = send(&app, "GET", "/transactions?date=not-a-date").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("YYYY-MM-DD"));
}

#[tokio::test]
async fn test_get_single_line_enriched() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 250).await;

    let (_, created) = send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({
            "payment_method": "card",
            "items": [{ "item_id": a, "quantity_sold": 2 }]
        }),
    )
    .await;

    // The memory store assigns line ids from 1.
    let (status, json) = send(&app, "GET", "/transactions/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["item_name"], "Atlas");
    assert_eq!(json["quantity_sold"], 2);
    assert_eq!(json["total_price"], 5.0);
    assert_eq!(json["payment_method"], "card");
    assert_eq!(json["transaction_id"], created["transaction_id"]);

    let (status, _) = send(&app, "GET", "/transactions/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_line_does_not_restock() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 100).await;

    send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 4 }] }),
    )
    .await;

    let (status, json) = send(&app, "DELETE", "/transactions/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Transaction deleted.");

    let item = state
        .store
        .get_item(common::ItemId::new(a))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 6);

    let (status, _) = send(&app, "DELETE", "/transactions/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_crud_and_barcode_lookup() {
    let (app, _) = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/items",
        serde_json::json!({
            "name": "Primary Mathematics Grade 1",
            "quantity": 40,
            "buying_price": 3.5,
            "selling_price": 5.0,
            "barcode": "BK001"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Item created successfully.");
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(&app, "GET", &format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Primary Mathematics Grade 1");
    assert_eq!(json["selling_price"], 5.0);

    let (status, json) = send(&app, "GET", "/items/barcode/BK001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id);

    let (status, _) = send(&app, "GET", "/items/barcode/MISSING").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send_json(
        &app,
        "PUT",
        &format!("/items/{id}"),
        serde_json::json!({
            "name": "Primary Mathematics Grade 1",
            "quantity": 35,
            "buying_price": 3.5,
            "selling_price": 5.5,
            "barcode": "BK001"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Item updated successfully.");

    let (status, json) = send(&app, "GET", "/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["quantity"], 35);

    let (status, json) = send(&app, "DELETE", &format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Item deleted.");

    let (status, _) = send(&app, "GET", &format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_validation_and_duplicate_barcode() {
    let (app, _) = setup();

    let (status, _) = send_json(
        &app,
        "POST",
        "/items",
        serde_json::json!({
            "name": "  ",
            "quantity": 1,
            "buying_price": 1.0,
            "selling_price": 2.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/items",
        serde_json::json!({
            "name": "Atlas",
            "quantity": -1,
            "buying_price": 1.0,
            "selling_price": 2.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = serde_json::json!({
        "name": "Atlas",
        "quantity": 1,
        "buying_price": 1.0,
        "selling_price": 2.0,
        "barcode": "BK002"
    });
    let (status, _) = send_json(&app, "POST", "/items", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, json) = send_json(&app, "POST", "/items", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("BK002"));
}

#[tokio::test]
async fn test_deleted_item_leaves_readable_receipts() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 100).await;

    send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 1 }] }),
    )
    .await;
    let (status, _) = send(&app, "DELETE", &format!("/items/{a}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", "/transactions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["transactions"][0]["item_name"], serde_json::Value::Null);
    assert_eq!(json[0]["transactions"][0]["total_price"], 1.0);
}

#[tokio::test]
async fn test_suppliers() {
    let (app, _) = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/suppliers",
        serde_json::json!({
            "name": "Kenya Literature Bureau",
            "contact": "0722123456",
            "email": "sales@klb.co.ke"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Supplier created");
    assert_eq!(json["supplier"]["name"], "Kenya Literature Bureau");

    let (status, json) = send_json(
        &app,
        "POST",
        "/suppliers",
        serde_json::json!({ "name": "Kenya Literature Bureau" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Supplier already exists");

    let (status, json) = send(&app, "GET", "/suppliers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _) = setup();

    let (status, json) = send_json(
        &app,
        "POST",
        "/register",
        serde_json::json!({ "username": "admin", "password": "admin123", "role": "admin" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "User created successfully.");

    let (status, json) = send_json(
        &app,
        "POST",
        "/register",
        serde_json::json!({ "username": "admin", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "User already exists");

    let (status, json) = send_json(
        &app,
        "POST",
        "/login",
        serde_json::json!({ "username": "admin", "password": "admin123" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["access_token"].as_str().is_some());
    assert_eq!(json["username"], "admin");
    assert_eq!(json["role"], "admin");

    let (status, json) = send_json(
        &app,
        "POST",
        "/login",
        serde_json::json!({ "username": "admin", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid credentials");

    let (status, _) = send_json(
        &app,
        "POST",
        "/login",
        serde_json::json!({ "username": "nobody", "password": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stats() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 250).await;
    seed_item(&state, "Globe", 5, 100).await;

    send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 2 }] }),
    )
    .await;

    let (status, json) = send(&app, "GET", "/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalStock"], 13);
    assert_eq!(json["todaysSales"], 5.0);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_ledger_counters() {
    let (app, state) = setup();
    let a = seed_item(&state, "Atlas", 10, 100).await;
    send_json(
        &app,
        "POST",
        "/transactions",
        serde_json::json!({ "items": [{ "item_id": a, "quantity_sold": 1 }] }),
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rendered = String::from_utf8(body.to_vec()).unwrap();
    assert!(rendered.contains("ledger_sales_total"));
}
