//! Google Drive v3 REST API client.
//!
//! This crate provides:
//! - OAuth2 refresh-token authentication with token caching
//! - File listing, metadata, create/rename/move/copy/delete operations
//! - Folder-path resolution with find-or-create semantics
//! - Streamed multipart/related media uploads
//! - Ranged media downloads for streaming proxies
//! - Retry logic and request metrics

pub mod client;
pub mod error;
pub mod metrics;
pub mod multipart;
pub mod retry;
pub mod token_cache;
pub mod types;

pub use client::{DriveClient, DriveConfig};
pub use error::{DriveError, DriveResult};
pub use multipart::RelatedUpload;
pub use retry::{with_retry, RetryConfig};
pub use token_cache::{OauthCredentials, TokenCache};
pub use types::{ByteStream, ListKind, ListQuery, MediaStream, SortOrder};
