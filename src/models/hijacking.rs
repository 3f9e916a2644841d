use serde::{Deserialize, Serialize};

const RESOLVED_STATUSES: &[&str] = &["solved", "paid", "closed", "released"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HijackCase {
    #[serde(default)]
    pub case_id: u64,
    #[serde(default)]
    pub vessel_name: Option<String>,
    /// Ransom the pirates currently demand.
    pub requested_amount: i64,
    #[serde(default)]
    pub paid_amount: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_proposal: Option<i64>,
}

impl HijackCase {
    pub fn is_resolved(&self) -> bool {
        self.paid_amount.is_some() || RESOLVED_STATUSES.contains(&self.status.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RansomPayment {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub cash_after: Option<i64>,
}
