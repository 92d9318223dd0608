//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while invoking the external media tools.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg not found or not executable at {path}. Install system ffmpeg or set FFMPEG_PATH in the environment.")]
    EncoderUnavailable { path: String },

    #[error("{message}")]
    EncoderFailed {
        message: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Encoder binary missing or unrunnable at the given path.
    pub fn encoder_unavailable(path: impl Into<String>) -> Self {
        Self::EncoderUnavailable { path: path.into() }
    }

    /// Encoder exited with a failure, carrying a bounded diagnostic excerpt.
    pub fn encoder_failed(
        message: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncoderFailed {
            message: message.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
