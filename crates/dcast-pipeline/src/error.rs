//! Error types for the transcode pipeline.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while staging, encoding, or publishing an upload.
///
/// Job records store the rendered message verbatim, so lower-level errors
/// pass their messages through without an added prefix.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] dcast_media::MediaError),

    #[error(transparent)]
    Drive(#[from] dcast_drive::DriveError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
