//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use dcast_drive::DriveError;
use dcast_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// A storage call failed behind a stable client-facing headline.
    /// The upstream message travels in `details`.
    #[error("{headline}")]
    Upstream {
        headline: String,
        status: StatusCode,
        details: Option<String>,
    },

    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap a Drive failure under a stable headline, keeping its HTTP status.
    pub fn drive_operation(headline: impl Into<String>, source: DriveError) -> Self {
        Self::Upstream {
            headline: headline.into(),
            status: drive_status(&source),
            details: Some(source.to_string()),
        }
    }

    /// Upload failures always read the same to the client; the cause goes
    /// into `details`.
    pub fn upload_failed(details: impl Into<String>) -> Self {
        Self::Upstream {
            headline: "Failed to upload file".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            details: Some(details.into()),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Drive(e) => drive_status(e),
            ApiError::Pipeline(PipelineError::Drive(e)) => drive_status(e),
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn drive_status(e: &DriveError) -> StatusCode {
    e.http_status()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose upstream error details in production
        let details = match &self {
            ApiError::Upstream { details, .. } => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    None
                } else {
                    details.clone()
                }
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            details,
        };

        (
            status,
            [
                ("Cache-Control", "no-store, no-cache, must-revalidate"),
                ("Pragma", "no-cache"),
            ],
            Json(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_errors_keep_their_status() {
        let err = ApiError::from(DriveError::not_found("abc"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::drive_operation(
            "Failed to list files",
            DriveError::request_failed("boom"),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to list files");
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        let err = ApiError::bad_request("Missing id");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing id");
    }
}
