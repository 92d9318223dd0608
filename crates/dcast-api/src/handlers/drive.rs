//! File-manager CRUD handlers over the Drive client.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::warn;

use dcast_drive::{ListKind, ListQuery, SortOrder};
use dcast_models::{extract_drive_id, DriveFile, PublishedFile};

use crate::error::{ApiError, ApiResult};
use crate::handlers::no_store_headers;
use crate::state::AppState;

// ============================================================================
// Listing
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub folder_id: Option<String>,
    pub search: Option<String>,
    pub page_token: Option<String>,
    pub page_size: Option<u32>,
    pub order: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// List the children of a folder, with optional name search.
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Response> {
    let query = ListQuery {
        folder_id: params
            .folder_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "root".to_string()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        page_token: params.page_token,
        page_size: params.page_size,
        order: params
            .order
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default(),
        kind: params
            .kind
            .as_deref()
            .map(ListKind::from_param)
            .unwrap_or_default(),
    };

    let list = state
        .drive
        .list_files(&query)
        .await
        .map_err(|e| ApiError::drive_operation("Failed to list files", e))?;

    Ok((no_store_headers(), Json(list)).into_response())
}

// ============================================================================
// Folders
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Serialize)]
pub struct CreateFolderResponse {
    pub folder: PublishedFile,
}

/// Create one folder under a parent (default root).
pub async fn create_folder(
    State(state): State<AppState>,
    Json(body): Json<CreateFolderRequest>,
) -> ApiResult<Response> {
    if body.name.is_empty() {
        return Err(ApiError::bad_request("Missing name"));
    }
    let parent_id = body
        .parent_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "root".to_string());

    let folder = state
        .drive
        .create_folder(&body.name, &parent_id)
        .await
        .map_err(|e| ApiError::drive_operation("Failed to create folder", e))?;

    Ok((no_store_headers(), Json(CreateFolderResponse { folder })).into_response())
}

// ============================================================================
// Copy / Move
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub destination_id: String,
}

#[derive(Serialize)]
pub struct CopyOutcome {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PublishedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct CopyResponse {
    pub results: Vec<CopyOutcome>,
}

/// Copy files into a destination folder. Folders are rejected per-item;
/// one failure never aborts the rest of the batch.
pub async fn copy_files(
    State(state): State<AppState>,
    Json(body): Json<BatchRequest>,
) -> ApiResult<Response> {
    if body.ids.is_empty() || body.destination_id.is_empty() {
        return Err(ApiError::bad_request("Missing ids or destinationId"));
    }

    let mut results = Vec::with_capacity(body.ids.len());
    for id in body.ids {
        let outcome = copy_one(&state, &id, &body.destination_id).await;
        results.push(match outcome {
            Ok(file) => CopyOutcome {
                id,
                file: Some(file),
                error: None,
            },
            Err(message) => {
                warn!(file_id = %id, "Copy failed: {}", message);
                CopyOutcome {
                    id,
                    file: None,
                    error: Some(message),
                }
            }
        });
    }

    Ok((no_store_headers(), Json(CopyResponse { results })).into_response())
}

async fn copy_one(state: &AppState, id: &str, destination_id: &str) -> Result<PublishedFile, String> {
    let meta = state
        .drive
        .get_metadata(id, None)
        .await
        .map_err(|e| e.to_string())?;
    if meta.is_folder() {
        return Err("Folder copy is not supported".to_string());
    }

    state
        .drive
        .copy_file(id, destination_id)
        .await
        .map_err(|e| e.to_string())
}

#[derive(Serialize)]
pub struct MoveOutcome {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<DriveFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub results: Vec<MoveOutcome>,
}

/// Move files into a destination folder by swapping parents.
pub async fn move_files(
    State(state): State<AppState>,
    Json(body): Json<BatchRequest>,
) -> ApiResult<Response> {
    if body.ids.is_empty() || body.destination_id.is_empty() {
        return Err(ApiError::bad_request("Missing ids or destinationId"));
    }

    let mut results = Vec::with_capacity(body.ids.len());
    for id in body.ids {
        match state.drive.move_file(&id, &body.destination_id).await {
            Ok(file) => results.push(MoveOutcome {
                id,
                file: Some(file),
                error: None,
            }),
            Err(e) => {
                warn!(file_id = %id, "Move failed: {}", e);
                results.push(MoveOutcome {
                    id,
                    file: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok((no_store_headers(), Json(MoveResponse { results })).into_response())
}

// ============================================================================
// Delete / Rename / Metadata
// ============================================================================

#[derive(Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
    pub permanent: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

/// Delete a file: trash by default, permanent when asked (falling back to
/// trash when permanent deletion is forbidden).
pub async fn delete_file(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Response> {
    let Some(id) = params.id.filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request("Missing id"));
    };
    let permanent = params.permanent.as_deref() == Some("true");

    state.drive.delete_file(&id, permanent).await?;

    Ok((no_store_headers(), Json(DeleteResponse { ok: true })).into_response())
}

#[derive(Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
pub struct RenameResponse {
    pub file: PublishedFile,
}

/// Rename a file.
pub async fn rename_file(
    State(state): State<AppState>,
    Json(body): Json<RenameRequest>,
) -> ApiResult<Response> {
    let name = body.name.trim();
    if body.id.is_empty() || name.is_empty() {
        return Err(ApiError::bad_request("Missing id or name"));
    }

    let file = state.drive.rename_file(&body.id, name).await?;

    Ok((no_store_headers(), Json(RenameResponse { file })).into_response())
}

#[derive(Deserialize)]
pub struct MetaParams {
    pub id: Option<String>,
    #[serde(rename = "resourceKey")]
    pub resource_key: Option<String>,
    #[serde(rename = "resourcekey")]
    pub resource_key_lower: Option<String>,
}

#[derive(Serialize)]
pub struct MetaResponse {
    pub file: DriveFile,
}

/// Fetch rich display metadata for one file.
pub async fn file_meta(
    State(state): State<AppState>,
    Query(params): Query<MetaParams>,
) -> ApiResult<Response> {
    let Some(id) = params.id.filter(|s| !s.is_empty()) else {
        return Err(ApiError::bad_request("Missing file id"));
    };
    let resource_key = params.resource_key.or(params.resource_key_lower);

    let file = state
        .drive
        .get_metadata(&id, resource_key.as_deref())
        .await
        .map_err(|e| ApiError::drive_operation("Failed to fetch metadata", e))?;

    Ok((no_store_headers(), Json(MetaResponse { file })).into_response())
}

// ============================================================================
// Link Resolution
// ============================================================================

#[derive(Deserialize)]
pub struct ResolveParams {
    pub url: Option<String>,
    pub u: Option<String>,
    pub name: Option<String>,
}

/// Resolve a Drive URL or bare id to the player route and redirect there.
pub async fn resolve_link(Query(params): Query<ResolveParams>) -> ApiResult<Response> {
    let input = params.url.or(params.u).unwrap_or_default();
    let name = params.name.unwrap_or_default();

    let Some(id) = extract_drive_id(&input) else {
        return Err(ApiError::bad_request("Invalid Google Drive URL or ID"));
    };

    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, watch_target(&id, &name))
        .header(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .body(Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

fn watch_target(id: &str, name: &str) -> String {
    let mut target = format!("/watch/{}", urlencoding::encode(id));
    if !name.is_empty() {
        target.push_str("?name=");
        target.push_str(&urlencoding::encode(name));
    }
    target
}

// ============================================================================
// Upload From Link
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFromLinkRequest {
    pub urls: Option<Vec<String>>,
    pub url: Option<String>,
    pub folder_id: Option<String>,
}

#[derive(Serialize)]
pub struct LinkOutcome {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PublishedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct UploadFromLinkResponse {
    pub results: Vec<LinkOutcome>,
}

/// Download remote files and publish them to Drive, one result per URL.
pub async fn upload_from_link(
    State(state): State<AppState>,
    Json(body): Json<UploadFromLinkRequest>,
) -> ApiResult<Response> {
    let urls = match body.urls {
        Some(urls) => urls,
        None => body.url.map(|u| vec![u]).unwrap_or_default(),
    };
    if urls.is_empty() {
        return Err(ApiError::bad_request("No urls provided"));
    }
    let folder_id = body
        .folder_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "root".to_string());

    let mut results = Vec::new();
    for raw in urls {
        let link = raw.trim().to_string();
        if link.is_empty() {
            continue;
        }
        match import_link(&state, &link, &folder_id).await {
            Ok(file) => results.push(LinkOutcome {
                url: link,
                file: Some(file),
                error: None,
            }),
            Err(message) => {
                warn!(url = %link, "Link import failed: {}", message);
                results.push(LinkOutcome {
                    url: link,
                    file: None,
                    error: Some(message),
                });
            }
        }
    }

    Ok((no_store_headers(), Json(UploadFromLinkResponse { results })).into_response())
}

async fn import_link(
    state: &AppState,
    link: &str,
    folder_id: &str,
) -> Result<PublishedFile, String> {
    let mut file_name = guess_name_from_url(link);
    let mut media_type = "application/octet-stream".to_string();

    // HEAD is best-effort: some hosts reject it outright
    if let Ok(head) = state.http.head(link).send().await {
        if let Some(ct) = header_text(&head, header::CONTENT_TYPE.as_str()) {
            media_type = ct;
        }
        if let Some(name) = header_text(&head, header::CONTENT_DISPOSITION.as_str())
            .as_deref()
            .and_then(filename_from_disposition)
        {
            file_name = name;
        }
    }

    let response = state.http.get(link).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("Failed to download ({})", response.status().as_u16()));
    }

    let media = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

    state
        .drive
        .upload_stream(&file_name, folder_id, &media_type, media)
        .await
        .map_err(|e| e.to_string())
}

fn header_text(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// The last non-empty path segment of the URL, percent-decoded, or
/// "download" when nothing usable is there.
fn guess_name_from_url(link: &str) -> String {
    let Ok(parsed) = url::Url::parse(link) else {
        return "download".to_string();
    };
    let last = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();
    match urlencoding::decode(last) {
        Ok(decoded) if !decoded.is_empty() => decoded.into_owned(),
        _ => "download".to_string(),
    }
}

/// Pull a filename out of a Content-Disposition header, preferring the
/// RFC 5987 `filename*` form.
fn filename_from_disposition(value: &str) -> Option<String> {
    let re = regex::Regex::new(r#"(?i)filename\*=UTF-8''([^;\s]+)|filename="?([^";]+)"?"#)
        .expect("valid filename pattern");
    let caps = re.captures(value)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_target_encodes_both_parts() {
        assert_eq!(watch_target("abc123", ""), "/watch/abc123");
        assert_eq!(
            watch_target("abc123", "My clip.mp4"),
            "/watch/abc123?name=My%20clip.mp4"
        );
    }

    #[test]
    fn test_guess_name_from_url() {
        assert_eq!(
            guess_name_from_url("https://cdn.example.com/media/Some%20Video.mp4?sig=abc"),
            "Some Video.mp4"
        );
        assert_eq!(guess_name_from_url("https://example.com/"), "download");
        assert_eq!(guess_name_from_url("not a url"), "download");
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="report.pdf""#),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''na%C3%AFve.mp4"),
            Some("naïve.mp4".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }
}
