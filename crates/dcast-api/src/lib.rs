//! Axum HTTP API server.
//!
//! This crate provides:
//! - Multipart upload intake with optional background transcoding
//! - Job progress polling
//! - A Drive file-manager CRUD surface
//! - Range-aware media streaming
//! - Prometheus metrics and security middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
