//! Multipart/related request bodies for Drive media uploads.
//!
//! The Drive v3 multipart upload endpoint wants a two-part
//! `multipart/related` body: a JSON metadata part followed by the raw
//! media part. reqwest's multipart support only emits `form-data`, so
//! the body is assembled by hand and streamed.

use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use uuid::Uuid;

use crate::error::DriveResult;

/// A `multipart/related` upload body under construction.
#[derive(Debug)]
pub struct RelatedUpload {
    boundary: String,
    metadata_json: String,
    media_type: String,
}

impl RelatedUpload {
    /// Build an upload body from file metadata and the media content type.
    pub fn new(metadata: &serde_json::Value, media_type: &str) -> DriveResult<Self> {
        Ok(Self {
            boundary: format!("drivecast_{}", Uuid::new_v4().simple()),
            metadata_json: serde_json::to_string(metadata)?,
            media_type: media_type.to_string(),
        })
    }

    /// Value for the request's Content-Type header.
    pub fn content_type(&self) -> String {
        format!("multipart/related; boundary={}", self.boundary)
    }

    /// Everything before the media bytes.
    fn head(&self) -> String {
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{json}\r\n--{b}\r\nContent-Type: {media}\r\n\r\n",
            b = self.boundary,
            json = self.metadata_json,
            media = self.media_type,
        )
    }

    /// Closing delimiter after the media bytes.
    fn tail(&self) -> String {
        format!("\r\n--{}--\r\n", self.boundary)
    }

    /// Wrap a media byte stream into the full request body.
    pub fn into_body<S>(self, media: S) -> reqwest::Body
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        let head = stream::iter([Ok(Bytes::from(self.head()))]);
        let tail = stream::iter([Ok(Bytes::from(self.tail()))]);
        reqwest::Body::wrap_stream(head.chain(media).chain(tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_carries_metadata_and_media_type() {
        let upload = RelatedUpload::new(
            &serde_json::json!({"name": "clip.mp4", "parents": ["root"]}),
            "video/mp4",
        )
        .unwrap();

        let head = upload.head();
        assert!(head.contains("Content-Type: application/json; charset=UTF-8"));
        assert!(head.contains(r#""name":"clip.mp4""#));
        assert!(head.contains("Content-Type: video/mp4"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_tail_closes_boundary() {
        let upload = RelatedUpload::new(&serde_json::json!({"name": "a"}), "text/plain").unwrap();
        let tail = upload.tail();
        assert!(tail.starts_with("\r\n--"));
        assert!(tail.ends_with("--\r\n"));
        assert!(tail.contains(&upload.boundary));
    }

    #[test]
    fn test_content_type_names_boundary() {
        let upload = RelatedUpload::new(&serde_json::json!({"name": "a"}), "text/plain").unwrap();
        let ct = upload.content_type();
        assert!(ct.starts_with("multipart/related; boundary=drivecast_"));
    }
}
