//! Request handlers.

pub mod drive;
pub mod health;
pub mod progress;
pub mod stream;
pub mod upload;

pub use drive::*;
pub use health::*;
pub use progress::*;
pub use stream::*;
pub use upload::*;

use axum::http::header::{self, HeaderName};

/// File-manager responses are never cached by browsers or proxies.
pub(crate) fn no_store_headers() -> [(HeaderName, &'static str); 2] {
    [
        (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        (header::PRAGMA, "no-cache"),
    ]
}
