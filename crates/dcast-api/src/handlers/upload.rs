//! Upload intake: direct publish or transcode dispatch.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::stream;
use serde::Serialize;

use dcast_drive::ByteStream;
use dcast_models::{JobId, PublishedFile};
use dcast_pipeline::{encode_requested, UploadPlan};

use crate::error::{ApiError, ApiResult};
use crate::handlers::no_store_headers;
use crate::state::AppState;

/// Response for uploads that started a background transcode job.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStartedResponse {
    pub job_id: JobId,
    pub status: String,
}

/// Response for uploads published as-is.
#[derive(Serialize)]
pub struct DirectUploadResponse {
    pub files: Vec<PublishedFile>,
}

/// Accept one multipart upload and either publish it directly or hand it to
/// the transcode pipeline.
///
/// Form fields: `folderId` (default root), `relativePath`, `encode`, and the
/// `file` part itself. Videos go through the pipeline unless encoding was
/// declined; everything else is published unchanged.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut folder_id = "root".to_string();
    let mut relative_path = String::new();
    let mut encode_field: Option<String> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::upload_failed(e.to_string()))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };

        match name.as_str() {
            "folderId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::upload_failed(e.to_string()))?;
                if !value.is_empty() {
                    folder_id = value;
                }
            }
            "relativePath" => {
                relative_path = field
                    .text()
                    .await
                    .map_err(|e| ApiError::upload_failed(e.to_string()))?;
            }
            "encode" => {
                encode_field = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::upload_failed(e.to_string()))?,
                );
            }
            "file" if file.is_none() => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::upload_failed(e.to_string()))?;
                file = Some((file_name, media_type, data));
            }
            _ => {}
        }
    }

    let Some((file_name, media_type, data)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let plan = UploadPlan {
        file_name,
        media_type,
        folder_id,
        relative_path,
        encode: encode_requested(encode_field.as_deref()),
    };
    let media = media_from_bytes(data);

    if plan.wants_pipeline() {
        let job_id = state.pipeline.start_transcode(plan, media).await;
        return Ok(Json(UploadStartedResponse {
            job_id,
            status: "started".to_string(),
        })
        .into_response());
    }

    let published = state
        .pipeline
        .direct_publish(&plan, media)
        .await
        .map_err(|e| ApiError::upload_failed(e.to_string()))?;

    Ok((
        no_store_headers(),
        Json(DirectUploadResponse {
            files: vec![published],
        }),
    )
        .into_response())
}

fn media_from_bytes(data: Bytes) -> ByteStream {
    Box::pin(stream::once(async move { Ok::<_, std::io::Error>(data) }))
}
