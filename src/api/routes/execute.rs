//! Manual trigger endpoint

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::{error, info};

use crate::api::{state::ApiState, types::ExecuteResponse};
use crate::orchestrator::Trigger;
use crate::window::ExecutionWindow;

/// ANY /execute?limit=<minutes>&skip=<minutes>
///
/// Hands a run to the supervisor and answers immediately; the outcome of the
/// run is only visible through error reporting.
pub async fn execute(
    State(state): State<ApiState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ExecuteResponse> {
    let window = ExecutionWindow::from_query(
        params.get("limit").map(String::as_str),
        params.get("skip").map(String::as_str),
    );

    info!("execute requested: limit={} skip={}", window.limit, window.skip);

    let orchestrator = state.orchestrator.clone();
    let run = async move { orchestrator.run_reported(Trigger::Http, window).await };

    if let Err(e) = state.supervisor.track(Trigger::Http, run).await {
        error!("failed to start run: {e:#}");
    }

    Json(ExecuteResponse {
        limit: window.limit,
        skip: window.skip,
        data: state.config().document().clone(),
    })
}
