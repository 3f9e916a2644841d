use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::broadcast::events;
use crate::views::{enrich_chats, ChatView};

#[derive(Deserialize)]
pub(super) struct SendRequest {
    recipient: u64,
    subject: String,
    body: String,
}

#[derive(Deserialize)]
pub(super) struct DeleteRequest {
    chat_ids: Vec<u64>,
}

pub(super) async fn list_chats(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<ChatView>>> {
    let chats = state.api.get_chat_list().await?;
    Ok(Json(enrich_chats(chats)))
}

pub(super) async fn get_chat(
    State(state): State<Arc<ApiState>>,
    Path(chat_id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let messages = state.api.get_chat(chat_id).await?;
    Ok(Json(json!({ "chat_id": chat_id, "messages": messages })))
}

pub(super) async fn send(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SendRequest>,
) -> ApiResult<Json<Value>> {
    if request.subject.trim().is_empty() || request.body.trim().is_empty() {
        return Err(ApiError::invalid("subject and body are required"));
    }

    state
        .api
        .send_message(request.recipient, request.subject.trim(), request.body.trim())
        .await?;
    state
        .broadcaster
        .send(events::MESSENGER_UPDATE, json!({ "sent_to": request.recipient }));

    Ok(Json(json!({ "success": true })))
}

pub(super) async fn delete(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    if request.chat_ids.is_empty() {
        return Err(ApiError::invalid("chat_ids must not be empty"));
    }

    state.api.delete_chats(&request.chat_ids).await?;
    state
        .broadcaster
        .send(events::MESSENGER_UPDATE, json!({ "deleted": request.chat_ids }));

    Ok(Json(json!({ "deleted": request.chat_ids.len() })))
}
