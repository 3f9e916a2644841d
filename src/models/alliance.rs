use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Alliance {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub members: u32,
    #[serde(default)]
    pub benefit_level: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AllianceChatEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub time_created: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AllianceMember {
    pub user_id: u64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub role: String,
}
