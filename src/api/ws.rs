use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::state::ApiState;
use crate::broadcast::{events, BroadcastEvent};

pub(super) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn is_ping(text: &str) -> bool {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(Value::as_str).map(|t| t == "ping"))
        .unwrap_or(false)
}

async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.broadcaster.subscribe();

    let hello = BroadcastEvent::new(
        events::HELLO,
        json!({
            "user_id": state.user.id,
            "company_name": state.user.company_name,
            "autopilot": state.autopilot.status(),
        }),
    );
    if sender.send(Message::Text(hello.to_json().into())).await.is_err() {
        return;
    }
    debug!("🔌 WebSocket client connected");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(event) => {
                    if sender.send(Message::Text(event.to_json().into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("🔌 WebSocket client lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if is_ping(text.as_str()) {
                        let pong = BroadcastEvent::new(events::PONG, json!({}));
                        if sender.send(Message::Text(pong.to_json().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("🔌 WebSocket client disconnected");
}
