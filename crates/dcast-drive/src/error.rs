//! Drive error types.

use thiserror::Error;

/// Result type for Drive operations.
pub type DriveResult<T> = Result<T, DriveError>;

/// Errors that can occur during Drive operations.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Drive API error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Map an HTTP status code from the Drive API to an error.
    pub fn from_http_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::AuthError(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(1000),
            500..=599 => Self::Upstream { status, message },
            _ => Self::RequestFailed(message),
        }
    }

    /// The HTTP status this error corresponds to, when one applies.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthError(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Suggested delay before retrying, from a Retry-After header.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriveError::Network(_) | DriveError::RateLimited(_) | DriveError::Upstream { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status_mapping() {
        assert!(matches!(
            DriveError::from_http_status(401, "x".into()),
            DriveError::AuthError(_)
        ));
        assert!(matches!(
            DriveError::from_http_status(403, "x".into()),
            DriveError::PermissionDenied(_)
        ));
        assert!(matches!(
            DriveError::from_http_status(404, "x".into()),
            DriveError::NotFound(_)
        ));
        assert!(matches!(
            DriveError::from_http_status(429, "x".into()),
            DriveError::RateLimited(_)
        ));
        assert!(matches!(
            DriveError::from_http_status(503, "x".into()),
            DriveError::Upstream { status: 503, .. }
        ));
        assert!(matches!(
            DriveError::from_http_status(400, "x".into()),
            DriveError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(DriveError::RateLimited(500).is_retryable());
        assert!(DriveError::Upstream {
            status: 500,
            message: "boom".into()
        }
        .is_retryable());
        assert!(!DriveError::NotFound("f".into()).is_retryable());
        assert!(!DriveError::AuthError("denied".into()).is_retryable());
    }

    #[test]
    fn test_http_status_round_trip() {
        let err = DriveError::from_http_status(404, "gone".into());
        assert_eq!(err.http_status(), Some(404));
        assert_eq!(DriveError::RateLimited(250).retry_after_ms(), Some(250));
    }
}
