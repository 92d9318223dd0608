//! Google Drive v3 REST API client.
//!
//! Production-grade client with:
//! - OAuth2 refresh-token grant with token caching
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{info_span, warn, Instrument};

use dcast_models::{DriveFile, FileList, PublishedFile, FOLDER_MIME_TYPE};

use crate::error::{DriveError, DriveResult};
use crate::metrics::record_request;
use crate::multipart::RelatedUpload;
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::{OauthCredentials, TokenCache};
use crate::types::{ListKind, ListQuery, MediaStream};

// =============================================================================
// Constants
// =============================================================================

/// Fields returned for folder listings.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, modifiedTime, iconLink, webViewLink, capabilities(canTrash, canDelete))";

/// Fields returned for single-file metadata lookups.
const META_FIELDS: &str =
    "id, name, mimeType, size, modifiedTime, fileExtension, iconLink, thumbnailLink, webViewLink, driveId";

/// Fields returned for create/copy/rename responses.
const ID_FIELDS: &str = "id, name";

/// Fields returned when resolving a file's current parents.
const PARENT_FIELDS: &str = "id, name, parents";

/// Cap on error body text carried into stream errors.
const STREAM_ERROR_EXCERPT_CHARS: usize = 500;

// =============================================================================
// Configuration
// =============================================================================

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived refresh token granted to this deployment
    pub refresh_token: String,
    /// Drive API base, normally `https://www.googleapis.com/drive/v3`
    pub api_base_url: String,
    /// Upload API base, normally `https://www.googleapis.com/upload/drive/v3`
    pub upload_base_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Request timeout for metadata operations (media transfers are untimed)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl DriveConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DriveResult<Self> {
        Ok(Self {
            client_id: require_env("CLIENT_ID")?,
            client_secret: require_env("CLIENT_SECRET")?,
            refresh_token: require_env("REFRESH_TOKEN")?,
            api_base_url: std::env::var("DRIVE_API_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/drive/v3".to_string()),
            upload_base_url: std::env::var("DRIVE_UPLOAD_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/upload/drive/v3".to_string()),
            token_url: std::env::var("DRIVE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(
                std::env::var("DRIVE_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            retry: RetryConfig::from_env(),
        })
    }
}

fn require_env(name: &str) -> DriveResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(DriveError::config_error(format!(
            "{} must be set to access Drive",
            name
        ))),
    }
}

// =============================================================================
// Client
// =============================================================================

/// Google Drive REST API client.
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    token_cache: Arc<TokenCache>,
}

impl Clone for DriveClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            token_cache: Arc::clone(&self.token_cache),
        }
    }
}

impl DriveClient {
    /// Create a new Drive client.
    pub fn new(config: DriveConfig) -> DriveResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("dcast-drive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DriveError::Network)?;

        let credentials = OauthCredentials {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            token_url: config.token_url.clone(),
        };

        Ok(Self {
            http: http.clone(),
            token_cache: Arc::new(TokenCache::new(http, credentials)),
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> DriveResult<Self> {
        Self::new(DriveConfig::from_env()?)
    }

    /// Get an access token.
    async fn get_token(&self) -> DriveResult<String> {
        self.token_cache.get_token().await
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("Invalid Credentials")
            || body.contains("authError")
            || body.contains("\"UNAUTHENTICATED\"")
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.config.api_base_url)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.config.api_base_url,
            urlencoding::encode(file_id)
        )
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List the children of a folder.
    ///
    /// A stale continuation token is retried once without the token so a
    /// listing never fails outright on pagination state. Search requests
    /// always start from the first page.
    pub async fn list_files(&self, query: &ListQuery) -> DriveResult<FileList> {
        let search = query
            .search
            .as_deref()
            .filter(|term| !term.is_empty());

        let mut q = format!("'{}' in parents and trashed = false", query.folder_id);
        if let Some(term) = search {
            q.push_str(&format!(" and name contains '{}'", escape_query_value(term)));
        }
        match query.kind {
            ListKind::Folders => {
                q.push_str(" and mimeType = 'application/vnd.google-apps.folder'")
            }
            ListKind::Files => q.push_str(" and mimeType != 'application/vnd.google-apps.folder'"),
            ListKind::All => {}
        }

        let page_size = query.page_size.unwrap_or(50).clamp(1, 100);
        let order_by = query.order.order_by();
        let page_token = if search.is_some() {
            None
        } else {
            query.page_token.as_deref().filter(|t| !t.is_empty())
        };

        let result = self
            .fetch_file_page(&q, page_size, order_by, page_token)
            .await;

        match result {
            Ok(list) => Ok(list),
            Err(e) if page_token.is_some() => {
                warn!(folder_id = %query.folder_id, "Listing with page token failed, retrying from first page: {}", e);
                self.fetch_file_page(&q, page_size, order_by, None).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_file_page(
        &self,
        q: &str,
        page_size: u32,
        order_by: &str,
        page_token: Option<&str>,
    ) -> DriveResult<FileList> {
        let url = self.files_url();
        let mut params = vec![
            ("q".to_string(), q.to_string()),
            ("pageSize".to_string(), page_size.to_string()),
            ("fields".to_string(), LIST_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
            ("includeItemsFromAllDrives".to_string(), "true".to_string()),
            ("corpora".to_string(), "allDrives".to_string()),
            ("orderBy".to_string(), order_by.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken".to_string(), token.to_string()));
        }

        self.execute_request("list_files", None, async {
            with_retry(&self.config.retry, "list_files", || async {
                let mut token = self.get_token().await?;
                let mut response = self
                    .http
                    .get(&url)
                    .query(&params)
                    .bearer_auth(&token)
                    .timeout(self.config.timeout)
                    .send()
                    .await?;
                let mut status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    let body = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body) {
                        self.token_cache.invalidate().await;
                        token = self.get_token().await?;
                        response = self
                            .http
                            .get(&url)
                            .query(&params)
                            .bearer_auth(&token)
                            .timeout(self.config.timeout)
                            .send()
                            .await?;
                        status = response.status();
                    } else {
                        return Err(DriveError::from_http_status(
                            status.as_u16(),
                            format!("{} failed: {}", url, body),
                        ));
                    }
                }

                match status {
                    StatusCode::OK => {
                        let list: FileList = response.json().await?;
                        Ok(list)
                    }
                    _ => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Fetch full display metadata for one file.
    pub async fn get_metadata(
        &self,
        file_id: &str,
        resource_key: Option<&str>,
    ) -> DriveResult<DriveFile> {
        self.execute_request(
            "get_metadata",
            Some(file_id),
            self.get_file_fields(file_id, META_FIELDS, resource_key),
        )
        .await
    }

    async fn get_file_fields(
        &self,
        file_id: &str,
        fields: &str,
        resource_key: Option<&str>,
    ) -> DriveResult<DriveFile> {
        let url = self.file_url(file_id);
        let mut params = vec![
            ("fields".to_string(), fields.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];
        if let Some(rk) = resource_key {
            params.push(("resourceKey".to_string(), rk.to_string()));
        }

        with_retry(&self.config.retry, "get_file", || async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .get(&url)
                .query(&params)
                .bearer_auth(&token)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.token_cache.invalidate().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .get(&url)
                        .query(&params)
                        .bearer_auth(&token)
                        .timeout(self.config.timeout)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(DriveError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            match status {
                StatusCode::OK => {
                    let file: DriveFile = response.json().await?;
                    Ok(file)
                }
                StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Folder and File Mutations
    // =========================================================================

    /// Create a folder under a parent.
    pub async fn create_folder(&self, name: &str, parent_id: &str) -> DriveResult<PublishedFile> {
        let url = self.files_url();
        let body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let params = [
            ("fields".to_string(), ID_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];

        self.execute_request("create_folder", None, async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .post(&url)
                .query(&params)
                .bearer_auth(&token)
                .json(&body)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body_text = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body_text) {
                    self.token_cache.invalidate().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .post(&url)
                        .query(&params)
                        .bearer_auth(&token)
                        .json(&body)
                        .timeout(self.config.timeout)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(DriveError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ));
                }
            }

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let folder: PublishedFile = response.json().await?;
                    Ok(folder)
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Rename a file or folder.
    pub async fn rename_file(&self, file_id: &str, name: &str) -> DriveResult<PublishedFile> {
        let url = self.file_url(file_id);
        let body = serde_json::json!({ "name": name });
        let params = [
            ("fields".to_string(), ID_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];

        self.execute_request("rename_file", Some(file_id), async {
            with_retry(&self.config.retry, "rename_file", || async {
                let mut token = self.get_token().await?;
                let mut response = self
                    .http
                    .patch(&url)
                    .query(&params)
                    .bearer_auth(&token)
                    .json(&body)
                    .timeout(self.config.timeout)
                    .send()
                    .await?;
                let mut status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    let body_text = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body_text) {
                        self.token_cache.invalidate().await;
                        token = self.get_token().await?;
                        response = self
                            .http
                            .patch(&url)
                            .query(&params)
                            .bearer_auth(&token)
                            .json(&body)
                            .timeout(self.config.timeout)
                            .send()
                            .await?;
                        status = response.status();
                    } else {
                        return Err(DriveError::from_http_status(
                            status.as_u16(),
                            format!("{} failed: {}", url, body_text),
                        ));
                    }
                }

                match status {
                    StatusCode::OK => {
                        let file: PublishedFile = response.json().await?;
                        Ok(file)
                    }
                    StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                    _ => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Move a file to a new parent folder.
    ///
    /// Drive expresses moves as a parent swap, so the file's current
    /// parents are resolved first and all of them removed.
    pub async fn move_file(&self, file_id: &str, destination_id: &str) -> DriveResult<DriveFile> {
        let meta = self.get_file_fields(file_id, PARENT_FIELDS, None).await?;
        let remove_parents = meta.parents.unwrap_or_default().join(",");

        let url = self.file_url(file_id);
        let body = serde_json::json!({});
        let params = [
            ("addParents".to_string(), destination_id.to_string()),
            ("removeParents".to_string(), remove_parents),
            ("fields".to_string(), PARENT_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];

        self.execute_request("move_file", Some(file_id), async {
            with_retry(&self.config.retry, "move_file", || async {
                let mut token = self.get_token().await?;
                let mut response = self
                    .http
                    .patch(&url)
                    .query(&params)
                    .bearer_auth(&token)
                    .json(&body)
                    .timeout(self.config.timeout)
                    .send()
                    .await?;
                let mut status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    let body_text = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body_text) {
                        self.token_cache.invalidate().await;
                        token = self.get_token().await?;
                        response = self
                            .http
                            .patch(&url)
                            .query(&params)
                            .bearer_auth(&token)
                            .json(&body)
                            .timeout(self.config.timeout)
                            .send()
                            .await?;
                        status = response.status();
                    } else {
                        return Err(DriveError::from_http_status(
                            status.as_u16(),
                            format!("{} failed: {}", url, body_text),
                        ));
                    }
                }

                match status {
                    StatusCode::OK => {
                        let file: DriveFile = response.json().await?;
                        Ok(file)
                    }
                    StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                    _ => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Copy a file into a destination folder. Folders cannot be copied.
    pub async fn copy_file(&self, file_id: &str, destination_id: &str) -> DriveResult<PublishedFile> {
        let url = format!("{}/copy", self.file_url(file_id));
        let body = serde_json::json!({ "parents": [destination_id] });
        let params = [
            ("fields".to_string(), ID_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];

        self.execute_request("copy_file", Some(file_id), async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .post(&url)
                .query(&params)
                .bearer_auth(&token)
                .json(&body)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body_text = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body_text) {
                    self.token_cache.invalidate().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .post(&url)
                        .query(&params)
                        .bearer_auth(&token)
                        .json(&body)
                        .timeout(self.config.timeout)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(DriveError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body_text),
                    ));
                }
            }

            match status {
                StatusCode::OK => {
                    let file: PublishedFile = response.json().await?;
                    Ok(file)
                }
                StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Move a file to the trash.
    pub async fn trash_file(&self, file_id: &str) -> DriveResult<()> {
        let url = self.file_url(file_id);
        let body = serde_json::json!({ "trashed": true });
        let params = [("supportsAllDrives".to_string(), "true".to_string())];

        self.execute_request("trash_file", Some(file_id), async {
            with_retry(&self.config.retry, "trash_file", || async {
                let mut token = self.get_token().await?;
                let mut response = self
                    .http
                    .patch(&url)
                    .query(&params)
                    .bearer_auth(&token)
                    .json(&body)
                    .timeout(self.config.timeout)
                    .send()
                    .await?;
                let mut status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    let body_text = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body_text) {
                        self.token_cache.invalidate().await;
                        token = self.get_token().await?;
                        response = self
                            .http
                            .patch(&url)
                            .query(&params)
                            .bearer_auth(&token)
                            .json(&body)
                            .timeout(self.config.timeout)
                            .send()
                            .await?;
                        status = response.status();
                    } else {
                        return Err(DriveError::from_http_status(
                            status.as_u16(),
                            format!("{} failed: {}", url, body_text),
                        ));
                    }
                }

                match status {
                    StatusCode::OK => Ok(()),
                    StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                    _ => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    /// Delete a file, either permanently or by trashing it.
    ///
    /// Shared-drive items often forbid permanent deletion for non-managers,
    /// so a 403 on a permanent delete falls back to trashing.
    pub async fn delete_file(&self, file_id: &str, permanent: bool) -> DriveResult<()> {
        if !permanent {
            return self.trash_file(file_id).await;
        }

        match self.hard_delete(file_id).await {
            Err(DriveError::PermissionDenied(_)) => self.trash_file(file_id).await,
            other => other,
        }
    }

    async fn hard_delete(&self, file_id: &str) -> DriveResult<()> {
        let url = self.file_url(file_id);
        let params = [("supportsAllDrives".to_string(), "true".to_string())];

        self.execute_request("delete_file", Some(file_id), async {
            with_retry(&self.config.retry, "delete_file", || async {
                let mut token = self.get_token().await?;
                let mut response = self
                    .http
                    .delete(&url)
                    .query(&params)
                    .bearer_auth(&token)
                    .timeout(self.config.timeout)
                    .send()
                    .await?;
                let mut status = response.status();

                if status == StatusCode::UNAUTHORIZED {
                    let body = response.text().await.unwrap_or_default();
                    if Self::is_access_token_expired(&body) {
                        self.token_cache.invalidate().await;
                        token = self.get_token().await?;
                        response = self
                            .http
                            .delete(&url)
                            .query(&params)
                            .bearer_auth(&token)
                            .timeout(self.config.timeout)
                            .send()
                            .await?;
                        status = response.status();
                    } else {
                        return Err(DriveError::from_http_status(
                            status.as_u16(),
                            format!("{} failed: {}", url, body),
                        ));
                    }
                }

                match status {
                    StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                    StatusCode::NOT_FOUND => Err(DriveError::not_found(file_id.to_string())),
                    _ => Err(Self::handle_error_response(status, &url, response).await),
                }
            })
            .await
        })
        .await
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Upload a staged file as a new Drive file.
    pub async fn upload_file(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        file_path: &Path,
    ) -> DriveResult<PublishedFile> {
        let file = tokio::fs::File::open(file_path).await?;
        self.upload_stream(name, parent_id, media_type, ReaderStream::new(file))
            .await
    }

    /// Upload a byte stream as a new Drive file.
    ///
    /// The body streams through without buffering, so this is a single
    /// attempt: a broken source stream fails the upload.
    pub async fn upload_stream<S>(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        media: S,
    ) -> DriveResult<PublishedFile>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        let url = format!("{}/files", self.config.upload_base_url);
        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        });
        let upload = RelatedUpload::new(&metadata, media_type)?;
        let params = [
            ("uploadType".to_string(), "multipart".to_string()),
            ("fields".to_string(), ID_FIELDS.to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
        ];

        self.execute_request("upload_file", None, async {
            let token = self.get_token().await?;
            let content_type = upload.content_type();
            let response = self
                .http
                .post(&url)
                .query(&params)
                .bearer_auth(&token)
                .header(header::CONTENT_TYPE, content_type)
                .body(upload.into_body(media))
                .send()
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK | StatusCode::CREATED => {
                    let file: PublishedFile = response.json().await?;
                    Ok(file)
                }
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Walk a relative path under a parent, creating missing folders.
    ///
    /// Every path segment is a folder name. Returns the ID of the deepest
    /// folder, or the parent itself for an empty path.
    pub async fn ensure_folder_path(
        &self,
        parent_id: &str,
        relative_path: &str,
    ) -> DriveResult<String> {
        let mut current = parent_id.to_string();
        for name in relative_path
            .split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
        {
            current = self.find_or_create_folder(&current, name).await?;
        }
        Ok(current)
    }

    async fn find_or_create_folder(&self, parent_id: &str, name: &str) -> DriveResult<String> {
        let q = format!(
            "'{}' in parents and trashed = false and mimeType = '{}' and name = '{}'",
            parent_id,
            FOLDER_MIME_TYPE,
            escape_query_value(name)
        );
        let url = self.files_url();
        let params = [
            ("q".to_string(), q),
            ("pageSize".to_string(), "1".to_string()),
            ("fields".to_string(), "files(id, name)".to_string()),
            ("supportsAllDrives".to_string(), "true".to_string()),
            ("includeItemsFromAllDrives".to_string(), "true".to_string()),
            ("corpora".to_string(), "allDrives".to_string()),
        ];

        let found: FileList = with_retry(&self.config.retry, "find_folder", || async {
            let mut token = self.get_token().await?;
            let mut response = self
                .http
                .get(&url)
                .query(&params)
                .bearer_auth(&token)
                .timeout(self.config.timeout)
                .send()
                .await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.token_cache.invalidate().await;
                    token = self.get_token().await?;
                    response = self
                        .http
                        .get(&url)
                        .query(&params)
                        .bearer_auth(&token)
                        .timeout(self.config.timeout)
                        .send()
                        .await?;
                    status = response.status();
                } else {
                    return Err(DriveError::from_http_status(
                        status.as_u16(),
                        format!("{} failed: {}", url, body),
                    ));
                }
            }

            match status {
                StatusCode::OK => Ok(response.json().await?),
                _ => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await?;

        if let Some(existing) = found.files.into_iter().next() {
            return Ok(existing.id);
        }

        let created = self.create_folder(name, parent_id).await?;
        Ok(created.id)
    }

    // =========================================================================
    // Media Streaming
    // =========================================================================

    /// Fetch file content, forwarding an optional Range header.
    ///
    /// Tries a plain media fetch first. When that is rejected (commonly for
    /// shared-drive items) the fetch is repeated with shared-drive support
    /// before reporting the original failure.
    pub async fn fetch_media(
        &self,
        file_id: &str,
        resource_key: Option<&str>,
        range: Option<&str>,
    ) -> DriveResult<MediaStream> {
        self.execute_request("fetch_media", Some(file_id), async {
            let token = self.get_token().await?;
            let url = self.file_url(file_id);
            let mut params = vec![("alt".to_string(), "media".to_string())];
            if let Some(rk) = resource_key {
                params.push(("resourceKey".to_string(), rk.to_string()));
            }

            let mut request = self.http.get(&url).query(&params).bearer_auth(&token);
            if let Some(r) = range {
                request = request.header(header::RANGE, r);
            }
            let response = request.send().await?;
            let status = response.status();

            if status.is_success() || status == StatusCode::PARTIAL_CONTENT {
                return Ok(Self::media_stream_from(response));
            }

            let primary_status = status.as_u16();
            let primary_body = response.text().await.unwrap_or_default();

            let mut fallback_params = params.clone();
            fallback_params.push(("supportsAllDrives".to_string(), "true".to_string()));
            let mut fallback = self
                .http
                .get(&url)
                .query(&fallback_params)
                .bearer_auth(&token);
            if let Some(r) = range {
                fallback = fallback.header(header::RANGE, r);
            }

            match fallback.send().await {
                Ok(resp)
                    if resp.status().is_success()
                        || resp.status() == StatusCode::PARTIAL_CONTENT =>
                {
                    Ok(Self::media_stream_from(resp))
                }
                fallback_result => {
                    if let Err(e) = fallback_result {
                        warn!(file_id = %file_id, "Media fallback fetch failed: {}", e);
                    }
                    let excerpt: String = primary_body
                        .chars()
                        .take(STREAM_ERROR_EXCERPT_CHARS)
                        .collect();
                    Err(DriveError::from_http_status(
                        primary_status,
                        format!("media fetch for {} failed: {}", file_id, excerpt),
                    ))
                }
            }
        })
        .await
    }

    fn media_stream_from(response: reqwest::Response) -> MediaStream {
        let status = response.status().as_u16();
        let headers = response.headers();
        let content_type = header_string(headers, header::CONTENT_TYPE);
        let content_length = header_string(headers, header::CONTENT_LENGTH);
        let accept_ranges = header_string(headers, header::ACCEPT_RANGES);
        let content_range = header_string(headers, header::CONTENT_RANGE);
        let etag = header_string(headers, header::ETAG);
        let last_modified = header_string(headers, header::LAST_MODIFIED);

        MediaStream {
            status,
            content_type,
            content_length,
            accept_ranges,
            content_range,
            etag,
            last_modified,
            body: Box::pin(
                response
                    .bytes_stream()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
            ),
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        file_id: Option<&str>,
        fut: F,
    ) -> DriveResult<T>
    where
        F: std::future::Future<Output = DriveResult<T>>,
    {
        let span = if let Some(id) = file_id {
            info_span!("drive_request", operation = %operation, file_id = %id)
        } else {
            info_span!("drive_request", operation = %operation)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> DriveError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return DriveError::RateLimited(retry_after_ms);
        }

        let body = response.text().await.unwrap_or_default();
        DriveError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Escape a value for interpolation into a Drive `q` expression.
fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\'' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

// =============================================================================
// Tests
// =============================================================================
