use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnchorInfo {
    /// Price of a single anchor point.
    pub price: i64,
    /// Anchor points still under construction.
    #[serde(default)]
    pub pending_amount: u32,
    #[serde(default)]
    pub anchor_points: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnchorPurchase {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub cash_after: Option<i64>,
}
