use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Events buffered per subscriber before a slow client starts skipping.
const CHANNEL_CAPACITY: usize = 256;

/// One message pushed to every connected UI client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastEvent {
    pub fn new(event_type: &str, data: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of String/Value/DateTime always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Central fan-out for everything the UI should hear about.
/// Cloning is cheap and all clones feed the same channel.
#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having nobody listening is not an error.
    pub fn send(&self, event_type: &str, data: Value) {
        let event = BroadcastEvent::new(event_type, data);
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!("📡 {} delivered to {} client(s)", event_type, delivered);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Event type names shared by the pilots, routes and UI.
pub mod events {
    pub const HELLO: &str = "hello";
    pub const PONG: &str = "pong";
    pub const AUTOPILOT_STATUS: &str = "autopilot_status";
    pub const SETTINGS_UPDATE: &str = "settings_update";
    pub const ALLIANCE_CHAT: &str = "alliance_chat";
    pub const MESSENGER_UPDATE: &str = "messenger_update";
    pub const HIJACKING_DETECTED: &str = "hijacking_detected";
    pub const HIJACKING_UPDATE: &str = "hijacking_update";
    pub const REPAIR_COMPLETE: &str = "repair_complete";
    pub const ANCHOR_PURCHASED: &str = "anchor_purchased";
    pub const COOP_SENT: &str = "coop_sent";
    pub const STAFF_UPDATE: &str = "staff_update";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const NOTIFICATION: &str = "notification";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let broadcaster = Broadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.send(events::REPAIR_COMPLETE, json!({ "count": 3 }));

        assert_eq!(first.recv().await.unwrap().data["count"], 3);
        assert_eq!(second.recv().await.unwrap().event_type, "repair_complete");
    }

    #[test]
    fn sending_without_listeners_is_silent() {
        let broadcaster = Broadcaster::new();
        broadcaster.send(events::NOTIFICATION, json!("nobody home"));
        assert_eq!(broadcaster.client_count(), 0);
    }

    #[test]
    fn event_serializes_with_type_key() {
        let event = BroadcastEvent::new(events::PONG, Value::Null);
        let json: Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(json["type"], "pong");
        assert!(json["timestamp"].is_string());
    }
}
