use serde::{Deserialize, Serialize};
use serde_json::Value;

const HIJACK_NOTIFICATION: &str = "vessel_got_hijacked";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatSummary {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub system_chat: bool,
    /// Unread flag.
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub time_last_message: i64,
    #[serde(default)]
    pub participants_string: Option<String>,
    #[serde(default)]
    pub values: Option<Value>,
}

impl ChatSummary {
    /// Case id when this chat is a hijack notification.
    pub fn hijack_case_id(&self) -> Option<u64> {
        if !self.system_chat || self.body.as_deref() != Some(HIJACK_NOTIFICATION) {
            return None;
        }
        self.values.as_ref()?.get("case_id")?.as_u64()
    }

    pub fn hijacked_vessel_name(&self) -> Option<String> {
        self.values
            .as_ref()?
            .get("vessel_name")?
            .as_str()
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_mine: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub user_id: Option<u64>,
}
