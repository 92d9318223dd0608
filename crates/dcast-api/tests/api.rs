//! HTTP surface tests over the full router and middleware stack.
//!
//! Everything here stops at the validation layer, so no request ever
//! reaches Google Drive.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use dcast_api::{create_router, ApiConfig, AppState};

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

/// Test the /healthz alias serves the same probe.
#[tokio::test]
async fn test_healthz_alias() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Test security headers and request id are stamped on every response.
#[tokio::test]
async fn test_security_headers() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get("X-Content-Type-Options").unwrap(),
        &"nosniff"
    );
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
    assert_eq!(
        headers.get("Cross-Origin-Resource-Policy").unwrap(),
        &"same-origin"
    );
}

/// Test a supplied request id round-trips to the response.
#[tokio::test]
async fn test_request_id_passthrough() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "caller-chosen-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Request-ID").unwrap(),
        &"caller-chosen-id"
    );
}

/// Test CORS preflight under the permissive default config.
#[tokio::test]
async fn test_cors_preflight() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/drive/list")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT
    );
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

/// Test progress poll without an id.
#[tokio::test]
async fn test_progress_requires_id() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/drive/upload/progress")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing id");
}

/// Test progress poll for a job id nobody has seen.
#[tokio::test]
async fn test_progress_unknown_job() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/drive/upload/progress?id=no-such-job")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cache = response
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cache.contains("no-store"));
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "unknown");
}

/// Test multipart upload with no file part.
#[tokio::test]
async fn test_upload_requires_file_part() {
    let app = test_router();

    let boundary = "x-dcast-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"folderId\"\r\n\r\nroot\r\n--{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/drive/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "No file provided");
}

/// Test resolve redirects a bare file id to the player route.
#[tokio::test]
async fn test_resolve_redirects_bare_id() {
    let app = test_router();
    let id = "1A2b3C4d5E6f7G8h9I0jQRSTuv";

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/drive/resolve?url={id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some(format!("/watch/{id}").as_str())
    );
}

/// Test resolve rejects input with no extractable id.
#[tokio::test]
async fn test_resolve_rejects_garbage() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/drive/resolve?url=not-a-drive-link")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Invalid Google Drive URL or ID");
}

/// Test delete without an id.
#[tokio::test]
async fn test_delete_requires_id() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/drive/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing id");
}

/// Test folder creation with a blank name.
#[tokio::test]
async fn test_create_folder_requires_name() {
    let app = test_router();

    let response = app
        .oneshot(json_request(
            "POST",
            "/drive/create-folder",
            json!({ "name": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing name");
}

/// Test copy with no ids or destination.
#[tokio::test]
async fn test_copy_requires_ids() {
    let app = test_router();

    let response = app
        .oneshot(json_request("POST", "/drive/copy", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing ids or destinationId");
}

/// Test rename with a whitespace-only name.
#[tokio::test]
async fn test_rename_requires_name() {
    let app = test_router();

    let response = app
        .oneshot(json_request(
            "POST",
            "/drive/rename",
            json!({ "id": "abc", "name": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing id or name");
}

/// Test upload-from-link with an empty body.
#[tokio::test]
async fn test_upload_from_link_requires_urls() {
    let app = test_router();

    let response = app
        .oneshot(json_request("POST", "/drive/upload-from-link", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "No urls provided");
}

/// Test streaming by query without an id.
#[tokio::test]
async fn test_stream_query_requires_id() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/drive/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing file id");
}

/// Test metadata fetch without an id.
#[tokio::test]
async fn test_meta_requires_id() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/drive/meta")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["error"], "Missing file id");
}

/// Helper to build the full router against a seeded environment.
fn test_router() -> Router {
    for (key, value) in [
        ("CLIENT_ID", "test-client.apps.googleusercontent.com"),
        ("CLIENT_SECRET", "test-client-secret"),
        ("REFRESH_TOKEN", "test-refresh-token"),
    ] {
        if std::env::var(key).is_err() {
            std::env::set_var(key, value);
        }
    }

    let state = AppState::new(ApiConfig::default()).expect("state from seeded env");
    create_router(state, None)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
