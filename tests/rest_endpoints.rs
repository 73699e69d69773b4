//! REST Endpoint Tests
//!
//! Drives the router built from a configuration file:
//! - Paginated listing and validation failures
//! - Single-record CRUD
//! - Export downloads and unknown resources

use std::io::Write;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use restquery::cli::build_server;
use restquery::config::ServiceConfig;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_file() -> NamedTempFile {
    let config = json!({
        "port": 8081,
        "resources": [{
            "model": {
                "name": "users",
                "fields": [
                    {"name": "id", "type": "int", "primary_key": true},
                    {"name": "name", "type": "str"},
                    {"name": "age", "type": ["int", "null"]},
                    {"name": "admin", "type": "bool", "default": false}
                ]
            },
            "filterable": ["name", "age", "admin"],
            "custom_fields": [
                {"name": "q", "predicate": {"multi_like": {"fields": ["name"]}}}
            ],
            "seed": [
                {"name": "ada", "age": 36, "admin": true},
                {"name": "grace", "age": 85},
                {"name": "linus", "age": 21},
                {"name": "ken", "age": null}
            ]
        }]
    });

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.to_string().as_bytes()).unwrap();
    file
}

fn router() -> Router {
    let file = config_file();
    let config = ServiceConfig::load(file.path()).unwrap();
    build_server(&config).unwrap().router()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(router, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, bytes.to_vec())
}

// =============================================================================
// Listing Tests
// =============================================================================

#[tokio::test]
async fn test_health() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_with_pagination_meta() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/users?perPage=3&orderBy=name", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ada", "grace", "ken"]);
    assert_eq!(body["meta"]["total"], 4);
    assert_eq!(body["meta"]["pages"], 2);
    assert_eq!(body["meta"]["page_total"], 3);
}

#[tokio::test]
async fn test_list_filters() {
    let router = router();

    let (_, body) = send(&router, Method::GET, "/users?age[gt]=30&admin=false", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "grace");

    let (_, body) = send(&router, Method::GET, "/users?age=null", None).await;
    assert_eq!(body["data"][0]["name"], "ken");

    let (_, body) = send(&router, Method::GET, "/users?q=NU", None).await;
    assert_eq!(body["data"][0]["name"], "linus");
}

#[tokio::test]
async fn test_invalid_parameters_are_422() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/users?age[gt][]=3&page=x", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
    let fields: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["param"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"age[gt][]"));
    assert!(fields.contains(&"page"));
}

#[tokio::test]
async fn test_unknown_resource() {
    let router = router();
    let (status, _) = send(&router, Method::GET, "/robots", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[tokio::test]
async fn test_get_single_and_missing() {
    let router = router();

    let (status, body) = send(&router, Method::GET, "/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "ada");

    let (status, body) = send(&router, Method::GET, "/users/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, _) = send(&router, Method::GET, "/users/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_patch_put_delete() {
    let router = router();

    let (status, body) =
        send(&router, Method::PATCH, "/users/2", Some(json!({"admin": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["admin"], true);
    assert_eq!(body["data"]["name"], "grace");

    let (status, _) = send(&router, Method::PATCH, "/users/50", Some(json!({"age": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        send(&router, Method::PUT, "/users/50", Some(json!({"name": "barbara"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 50);
    assert_eq!(body["data"]["admin"], false);

    let (status, _) = send(&router, Method::DELETE, "/users/50", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, Method::GET, "/users/50", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_rejects_bad_bodies() {
    let router = router();

    let (status, body) =
        send(&router, Method::PATCH, "/users/1", Some(json!({"admin": "yes"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["param"], "admin");

    let (status, _) = send(&router, Method::PATCH, "/users/1", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected updates leave the row untouched
    let (_, body) = send(&router, Method::GET, "/users/1", None).await;
    assert_eq!(body["data"]["admin"], true);
}

// =============================================================================
// Export Tests
// =============================================================================

#[tokio::test]
async fn test_export_download() {
    let router = router();
    let (status, headers, bytes) =
        send_raw(&router, Method::GET, "/users/export?admin=true", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"users.json\""
    );

    let rows: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "ada");
}
