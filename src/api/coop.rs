use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::broadcast::events;
use crate::models::CoopData;

#[derive(Deserialize)]
pub(super) struct SendCoopRequest {
    user_id: u64,
    vessels: u32,
}

pub(super) async fn get_coop(State(state): State<Arc<ApiState>>) -> ApiResult<Json<CoopData>> {
    Ok(Json(state.api.get_coop_data().await?))
}

pub(super) async fn send(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SendCoopRequest>,
) -> ApiResult<Json<Value>> {
    if request.vessels == 0 {
        return Err(ApiError::invalid("vessels must be at least 1"));
    }

    let result = state.api.send_coop(request.user_id, request.vessels).await?;
    state.broadcaster.send(
        events::COOP_SENT,
        json!({ "user_id": request.user_id, "vessels": request.vessels, "result": result }),
    );

    Ok(Json(result))
}
