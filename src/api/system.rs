use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiResult;
use super::state::ApiState;
use crate::autopilot::{AutopilotStatus, RunTrigger};
use crate::pilots::{PilotKind, PilotReport};
use crate::storage::AutopilotSettings;

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(super) async fn status(State(state): State<Arc<ApiState>>) -> Json<Value> {
    let autopilot = state.autopilot.status();
    Json(json!({
        "user_id": state.user.id,
        "company_name": state.user.company_name,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "paused": autopilot.paused,
        "autopilot": autopilot,
        "ws_clients": state.broadcaster.client_count(),
        "alliance_index": {
            "alliances": state.index.len(),
            "refreshed_at": state.index.refreshed_at(),
        },
    }))
}

pub(super) async fn get_settings(State(state): State<Arc<ApiState>>) -> Json<AutopilotSettings> {
    Json(state.autopilot.settings())
}

pub(super) async fn update_settings(
    State(state): State<Arc<ApiState>>,
    Json(settings): Json<AutopilotSettings>,
) -> ApiResult<Json<AutopilotSettings>> {
    Ok(Json(state.autopilot.update_settings(settings)?))
}

pub(super) async fn pause(State(state): State<Arc<ApiState>>) -> ApiResult<Json<AutopilotStatus>> {
    Ok(Json(state.autopilot.pause()?))
}

pub(super) async fn resume(State(state): State<Arc<ApiState>>) -> ApiResult<Json<AutopilotStatus>> {
    Ok(Json(state.autopilot.resume()?))
}

pub(super) async fn run_pilot(
    State(state): State<Arc<ApiState>>,
    Path(pilot): Path<String>,
) -> ApiResult<Json<PilotReport>> {
    let kind: PilotKind = pilot.parse()?;
    Ok(Json(state.autopilot.run(kind, RunTrigger::Manual).await?))
}
