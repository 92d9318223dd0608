//! Media streaming proxy with Range support.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StreamParams {
    pub id: Option<String>,
    #[serde(rename = "resourceKey")]
    pub resource_key: Option<String>,
    #[serde(rename = "resourcekey")]
    pub resource_key_lower: Option<String>,
}

/// Stream a Drive file addressed by path id.
pub async fn stream_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    proxy_media(state, id, params, headers).await
}

/// Stream a Drive file addressed by `?id=`.
pub async fn stream_query(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let Some(id) = params.id.clone().filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request("Missing file id"));
    };
    proxy_media(state, id, params, headers).await
}

/// Forward the client's Range header to Drive and pass the byte stream
/// through, keeping the upstream content headers.
async fn proxy_media(
    state: AppState,
    id: String,
    params: StreamParams,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let resource_key = params.resource_key.or(params.resource_key_lower);
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let media = state
        .drive
        .fetch_media(&id, resource_key.as_deref(), range.as_deref())
        .await
        .map_err(|e| ApiError::drive_operation("Failed to stream file", e))?;

    let status = if media.status == 206 || range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            media.content_type.as_deref().unwrap_or("video/mp4"),
        )
        .header(header::VARY, "Range")
        .header(
            header::CACHE_CONTROL,
            "public, max-age=86400, s-maxage=86400, stale-while-revalidate=604800",
        )
        .header("Cross-Origin-Resource-Policy", "cross-origin");

    if let Some(v) = &media.content_length {
        builder = builder.header(header::CONTENT_LENGTH, v.as_str());
    }
    if let Some(v) = &media.accept_ranges {
        builder = builder.header(header::ACCEPT_RANGES, v.as_str());
    }
    if let Some(v) = &media.content_range {
        builder = builder.header(header::CONTENT_RANGE, v.as_str());
    }
    if let Some(v) = &media.etag {
        builder = builder.header(header::ETAG, v.as_str());
    }
    if let Some(v) = &media.last_modified {
        builder = builder.header(header::LAST_MODIFIED, v.as_str());
    }

    builder
        .body(Body::from_stream(media.body))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
