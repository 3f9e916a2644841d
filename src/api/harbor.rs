use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::broadcast::events;
use crate::models::{AnchorInfo, AnchorPurchase};
use crate::views::{build_harbor_map, cached_ports, HarborMap};

#[derive(Deserialize)]
pub(super) struct PurchaseRequest {
    amount: u32,
}

pub(super) async fn harbor_map(State(state): State<Arc<ApiState>>) -> ApiResult<Json<HarborMap>> {
    let ports = cached_ports(state.api.as_ref(), &state.cache, state.port_ttl()).await?;
    let vessels = state.api.get_vessels().await?;
    let threshold = state.autopilot.settings().yard_foreman.wear_threshold;

    Ok(Json(build_harbor_map(&ports, &vessels, threshold)))
}

pub(super) async fn anchor_info(State(state): State<Arc<ApiState>>) -> ApiResult<Json<AnchorInfo>> {
    Ok(Json(state.api.get_anchor_info().await?))
}

pub(super) async fn purchase_anchor(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<Json<AnchorPurchase>> {
    if request.amount != 1 && request.amount != 10 {
        return Err(ApiError::invalid("amount must be 1 or 10"));
    }

    let purchase = state.api.purchase_anchor_points(request.amount).await?;
    state.cache.invalidate("company");
    state.broadcaster.send(
        events::ANCHOR_PURCHASED,
        json!({
            "amount": request.amount,
            "cost": purchase.cost,
            "cash_after": purchase.cash_after,
            "manual": true,
        }),
    );

    Ok(Json(purchase))
}
