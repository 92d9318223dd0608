//! Upload progress polling.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use dcast_models::JobId;

use crate::error::{ApiError, ApiResult};
use crate::handlers::no_store_headers;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProgressQuery {
    pub id: Option<String>,
}

/// Report the current record for one upload job.
///
/// Unknown ids are not an error: polling may outlive the job record, so the
/// client gets a sentinel instead of a 404.
pub async fn upload_progress(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Response> {
    let id = match query.id.as_deref().filter(|s| !s.is_empty()) {
        Some(id) => JobId::from_string(id),
        None => return Err(ApiError::bad_request("Missing id")),
    };

    let response = match state.progress.get(&id).await {
        Some(record) => (no_store_headers(), Json(record)).into_response(),
        None => (no_store_headers(), Json(json!({ "status": "unknown" }))).into_response(),
    };

    Ok(response)
}
