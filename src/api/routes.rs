//! Monitoring snapshot endpoint

use axum::{Json, extract::State};

use crate::actors::messages::SystemSnapshot;
use crate::api::{ApiError, ApiResult, ApiState};

/// GET /monitor
///
/// Returns the current system snapshot: handled-line count, throughput,
/// queue depths, uptime and error count.
pub async fn get_monitor(State(state): State<ApiState>) -> ApiResult<Json<SystemSnapshot>> {
    let snapshot = state
        .monitor
        .snapshot()
        .await
        .ok_or_else(|| ApiError::Internal("monitor actor unavailable".to_string()))?;

    Ok(Json(snapshot))
}
