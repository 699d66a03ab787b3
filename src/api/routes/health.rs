//! Health check endpoint

use axum::http::{HeaderName, header};
use axum::response::IntoResponse;

const SURROGATE_CONTROL: HeaderName = HeaderName::from_static("surrogate-control");

/// ANY /health
///
/// Plain "OK", never cached
pub async fn health_check() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain"),
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, proxy-revalidate",
            ),
            (header::EXPIRES, "0"),
            (SURROGATE_CONTROL, "no-store"),
        ],
        "OK",
    )
}
