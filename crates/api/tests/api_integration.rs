//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::RetryPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const USER_HEADER: &str = "x-authenticated-user";

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

async fn setup() -> axum::Router {
    let state = api::create_in_memory_state(RetryPolicy::immediate(3))
        .await
        .unwrap();
    api::create_app(state, get_metrics_handle())
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn assert_error(status: StatusCode, body: &Value, expected: StatusCode, code: &str, path: &str) {
    assert_eq!(status, expected, "body: {body}");
    assert_eq!(body["errorCode"], code);
    assert_eq!(body["path"], path);
    assert!(body["message"].is_string());
    assert!(body["details"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;

    let (status, json) = send(app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_get_quantity_returns_enriched_view() {
    let app = setup().await;

    let (status, json) = send(
        app,
        request(
            "GET",
            "/api/inventory/SKU-001/stores/1",
            Some("downtown_clerk"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["productSku"], "SKU-001");
    assert_eq!(json["productName"], "Wireless Mouse");
    assert_eq!(json["storeId"], 1);
    assert_eq!(json["storeName"], "Downtown");
    assert_eq!(json["availableQty"], 50);
    assert_eq!(json["version"], 1);
    assert!(json["id"].is_number());
    assert!(json["updatedAt"].is_string());
}

#[tokio::test]
async fn test_set_then_adjust() {
    let app = setup().await;

    let (status, json) = send(
        app.clone(),
        request(
            "PUT",
            "/api/inventory/SKU-002/stores/1",
            Some("downtown_clerk"),
            Some(json!({ "availableQty": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["availableQty"], 10);
    assert_eq!(json["version"], 1);

    let (status, json) = send(
        app.clone(),
        request(
            "POST",
            "/api/inventory/SKU-002/stores/1/adjustments",
            Some("downtown_clerk"),
            Some(json!({ "adjustment": -3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["availableQty"], 7);
    assert_eq!(json["version"], 2);

    let path = "/api/inventory/SKU-002/stores/1/adjustments";
    let (status, json) = send(
        app,
        request(
            "POST",
            path,
            Some("downtown_clerk"),
            Some(json!({ "adjustment": -10 })),
        ),
    )
    .await;
    assert_error(status, &json, StatusCode::CONFLICT, "INV-004", path);
}

#[tokio::test]
async fn test_across_stores_for_admin() {
    let app = setup().await;

    let (status, json) = send(
        app,
        request("GET", "/api/inventory/SKU-001/stores", Some("admin"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let views = json.as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["storeId"], 1);
    assert_eq!(views[0]["availableQty"], 50);
    assert_eq!(views[1]["storeName"], "Airport");
    assert_eq!(views[1]["availableQty"], 20);
}

#[tokio::test]
async fn test_across_stores_requires_admin() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores";

    let (status, json) = send(app, request("GET", path, Some("downtown_clerk"), None)).await;

    assert_error(status, &json, StatusCode::FORBIDDEN, "AUTH-008", path);
}

#[tokio::test]
async fn test_store_access_denied_without_grant() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/2";

    let (status, json) = send(
        app.clone(),
        request(
            "PUT",
            path,
            Some("downtown_clerk"),
            Some(json!({ "availableQty": 1 })),
        ),
    )
    .await;
    assert_error(status, &json, StatusCode::FORBIDDEN, "AUTH-009", path);

    let (_, json) = send(app, request("GET", path, Some("admin"), None)).await;
    assert_eq!(json["availableQty"], 20);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/1";

    let (status, json) = send(app, request("GET", path, None, None)).await;

    assert_error(status, &json, StatusCode::UNAUTHORIZED, "AUTH-006", path);
}

#[tokio::test]
async fn test_unknown_user_is_forbidden() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/1";

    let (status, json) = send(app, request("GET", path, Some("mallory"), None)).await;

    assert_error(status, &json, StatusCode::FORBIDDEN, "AUTH-007", path);
}

#[tokio::test]
async fn test_unknown_sku_is_not_found() {
    let app = setup().await;
    let path = "/api/inventory/NOPE/stores/1/adjustments";

    let (status, json) = send(
        app,
        request("POST", path, Some("admin"), Some(json!({ "adjustment": 1 }))),
    )
    .await;

    assert_error(status, &json, StatusCode::NOT_FOUND, "INV-001", path);
}

#[tokio::test]
async fn test_missing_inventory_is_not_found() {
    let app = setup().await;
    let path = "/api/inventory/SKU-002/stores/2";

    let (status, json) = send(app, request("GET", path, Some("admin"), None)).await;

    assert_error(status, &json, StatusCode::NOT_FOUND, "INV-003", path);
}

#[tokio::test]
async fn test_non_integer_store_id_is_rejected() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/downtown";

    let (status, json) = send(app, request("GET", path, Some("admin"), None)).await;

    assert_error(status, &json, StatusCode::BAD_REQUEST, "VAL-004", path);
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/1";

    let (status, json) = send(
        app,
        request("PUT", path, Some("admin"), Some(json!({ "quantity": "lots" }))),
    )
    .await;

    assert_error(status, &json, StatusCode::BAD_REQUEST, "VAL-001", path);
}

#[tokio::test]
async fn test_business_validation_codes() {
    let app = setup().await;
    let path = "/api/inventory/SKU-001/stores/1";

    let (status, json) = send(
        app.clone(),
        request("PUT", path, Some("admin"), Some(json!({ "availableQty": -1 }))),
    )
    .await;
    assert_error(status, &json, StatusCode::BAD_REQUEST, "INV-005", path);

    let path = "/api/inventory/SKU-001/stores/1/adjustments";
    let (status, json) = send(
        app.clone(),
        request("POST", path, Some("admin"), Some(json!({ "adjustment": 0 }))),
    )
    .await;
    assert_error(status, &json, StatusCode::BAD_REQUEST, "INV-009", path);

    let path = "/api/inventory/SKU-001/stores/0";
    let (status, json) = send(app, request("GET", path, Some("admin"), None)).await;
    assert_error(status, &json, StatusCode::BAD_REQUEST, "VAL-004", path);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;

    send(
        app.clone(),
        request(
            "PUT",
            "/api/inventory/SKU-001/stores/1",
            Some("admin"),
            Some(json!({ "availableQty": 5 })),
        ),
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

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("inventory_mutations_total"));
}
