use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaffMember {
    #[serde(rename = "type")]
    pub staff_type: String,
    #[serde(default)]
    pub salary: i64,
    #[serde(default)]
    pub morale: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
