//! Seam between the pipeline and the Drive client.

use std::path::Path;

use async_trait::async_trait;
use dcast_drive::{ByteStream, DriveClient, DriveResult};
use dcast_models::PublishedFile;

/// Destination for finished files. `DriveClient` is the production
/// implementation; tests substitute an in-memory recorder.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Resolves `relative_path` under `parent_id`, creating folders as
    /// needed, and returns the id of the innermost folder.
    async fn ensure_folder_path(&self, parent_id: &str, relative_path: &str)
        -> DriveResult<String>;

    /// Publishes a finished file from disk.
    async fn publish_file(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        path: &Path,
    ) -> DriveResult<PublishedFile>;

    /// Publishes a file streamed straight from the request body.
    async fn publish_stream(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        media: ByteStream,
    ) -> DriveResult<PublishedFile>;
}

#[async_trait]
impl Publisher for DriveClient {
    async fn ensure_folder_path(
        &self,
        parent_id: &str,
        relative_path: &str,
    ) -> DriveResult<String> {
        DriveClient::ensure_folder_path(self, parent_id, relative_path).await
    }

    async fn publish_file(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        path: &Path,
    ) -> DriveResult<PublishedFile> {
        self.upload_file(name, parent_id, media_type, path).await
    }

    async fn publish_stream(
        &self,
        name: &str,
        parent_id: &str,
        media_type: &str,
        media: ByteStream,
    ) -> DriveResult<PublishedFile> {
        self.upload_stream(name, parent_id, media_type, media).await
    }
}
