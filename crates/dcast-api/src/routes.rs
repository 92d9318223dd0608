//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::drive::{
    copy_files, create_folder, delete_file, file_meta, list_files, move_files, rename_file,
    resolve_link, upload_from_link,
};
use crate::handlers::health::health;
use crate::handlers::progress::upload_progress;
use crate::handlers::stream::{stream_file, stream_query};
use crate::handlers::upload::upload;
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Upload intake and job polling
    let upload_routes = Router::new()
        .route("/upload", post(upload))
        .route("/upload/progress", get(upload_progress))
        .route("/upload-from-link", post(upload_from_link));

    // File-manager CRUD
    let file_routes = Router::new()
        .route("/list", get(list_files))
        .route("/create-folder", post(create_folder))
        .route("/copy", post(copy_files))
        .route("/move", post(move_files))
        .route("/delete", delete(delete_file))
        .route("/rename", post(rename_file))
        .route("/meta", get(file_meta))
        .route("/resolve", get(resolve_link));

    // Media streaming, by path id or ?id=
    let stream_routes = Router::new()
        .route("/stream", get(stream_query))
        .route("/stream/:id", get(stream_file));

    let drive_routes = Router::new()
        .merge(upload_routes)
        .merge(file_routes)
        .merge(stream_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/drive", drive_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart uploads run well past axum's 2MB default
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
