use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use super::error::ApiResult;
use super::state::ApiState;
use crate::error::CopilotError;
use crate::storage::CaseHistory;

pub(super) async fn list_cases(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<CaseHistory>>> {
    Ok(Json(state.history().list()?))
}

pub(super) async fn get_case(
    State(state): State<Arc<ApiState>>,
    Path(case_id): Path<u64>,
) -> ApiResult<Json<CaseHistory>> {
    let history = state
        .history()
        .load(case_id)?
        .ok_or_else(|| CopilotError::NotFound(format!("hijacking case {}", case_id)))?;
    Ok(Json(history))
}

pub(super) async fn negotiate(
    State(state): State<Arc<ApiState>>,
    Path(case_id): Path<u64>,
) -> ApiResult<Json<CaseHistory>> {
    Ok(Json(state.autopilot.negotiate_case(case_id).await?))
}
