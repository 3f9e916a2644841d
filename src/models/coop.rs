use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoopData {
    #[serde(default)]
    pub coop: CoopSummary,
    #[serde(default)]
    pub members: Vec<CoopMember>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoopSummary {
    #[serde(default)]
    pub available: u32,
    #[serde(default)]
    pub cap: u32,
    #[serde(default)]
    pub sent_this_season: u32,
    #[serde(default)]
    pub received_this_season: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoopMember {
    pub user_id: u64,
    #[serde(default)]
    pub company_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
