//! Metric document endpoint

use axum::{Json, extract::State};
use serde_json::Value;

use crate::api::state::ApiState;

/// ANY /metrics
///
/// Returns the loaded metric document as it was read
pub async fn get_metrics(State(state): State<ApiState>) -> Json<Value> {
    Json(state.config().document().clone())
}
