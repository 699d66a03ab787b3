//! Route handlers

pub mod execute;
pub mod health;
pub mod metrics;

use axum::http::StatusCode;

/// Any unknown path: 404 with an empty body
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
