use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::broadcast::events;
use crate::models::StaffMember;

#[derive(Deserialize)]
pub(super) struct SalaryRequest {
    staff_type: String,
    /// `raise` or `reduce`
    action: String,
}

pub(super) async fn list_staff(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<StaffMember>>> {
    Ok(Json(state.api.get_staff().await?))
}

pub(super) async fn change_salary(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SalaryRequest>,
) -> ApiResult<Json<Value>> {
    let raise = match request.action.as_str() {
        "raise" => true,
        "reduce" => false,
        _ => return Err(ApiError::invalid("action must be 'raise' or 'reduce'")),
    };
    if request.staff_type.trim().is_empty() {
        return Err(ApiError::invalid("staff_type is required"));
    }

    let result = state.api.change_salary(&request.staff_type, raise).await?;
    state.broadcaster.send(
        events::STAFF_UPDATE,
        json!({ "staff_type": request.staff_type, "action": request.action, "result": result }),
    );

    Ok(Json(result))
}
