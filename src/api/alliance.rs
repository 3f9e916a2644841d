use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::broadcast::events;
use crate::views::{cached_members, enrich_alliance_chat};

const MAX_MESSAGE_CHARS: usize = 1000;
const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Deserialize)]
pub(super) struct PostChatRequest {
    text: String,
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

pub(super) async fn get_chat(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Value>> {
    let alliance_id = state.alliance_id().await?;
    let feed = state.api.get_alliance_chat(alliance_id).await?;
    let members = cached_members(state.api.as_ref(), &state.cache, alliance_id, state.lookup_ttl()).await?;

    Ok(Json(json!({
        "alliance_id": alliance_id,
        "messages": enrich_alliance_chat(feed, &members),
    })))
}

pub(super) async fn post_chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<PostChatRequest>,
) -> ApiResult<Json<Value>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::invalid("message must not be empty"));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::invalid(format!("message is longer than {} characters", MAX_MESSAGE_CHARS)));
    }

    let alliance_id = state.alliance_id().await?;
    if let Some(watcher) = &state.watcher {
        watcher.note_own_post(state.user.id, text);
    }
    if let Err(e) = state.api.post_alliance_chat(alliance_id, text).await {
        if let Some(watcher) = &state.watcher {
            watcher.forget_own_post(state.user.id, text);
        }
        return Err(e.into());
    }

    state.broadcaster.send(
        events::ALLIANCE_CHAT,
        json!({
            "messages": [{
                "type": "chat",
                "user_id": state.user.id,
                "company_name": state.user.company_name,
                "message": text,
                "time_created": Utc::now().timestamp(),
            }],
        }),
    );

    Ok(Json(json!({ "success": true })))
}

pub(super) async fn search(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).min(MAX_SEARCH_LIMIT);
    let results = state.index.search(&query.q, limit);

    Json(json!({
        "query": query.q,
        "total": results.len(),
        "indexed": state.index.len(),
        "results": results,
    }))
}
