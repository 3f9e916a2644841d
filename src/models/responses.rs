use serde::Deserialize;

use crate::models::*;

// Game API response wrappers: `{ "data": ..., "user": ... }`
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub user: Option<UserSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct UserSettingsResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CompanyData {
    pub company: Company,
}

#[derive(Debug, Deserialize)]
pub struct VesselsData {
    #[serde(default)]
    pub user_vessels: Vec<Vessel>,
}

#[derive(Debug, Deserialize)]
pub struct RepairData {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_cost: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnchorPurchaseData {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub amount: u32,
    #[serde(default)]
    pub cost: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChatData {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentData {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatFeedData {
    #[serde(default)]
    pub chat_feed: Vec<AllianceChatEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MembersData {
    #[serde(default)]
    pub members: Vec<AllianceMember>,
}

#[derive(Debug, Deserialize)]
pub struct AlliancesData {
    #[serde(default)]
    pub alliances: Vec<Alliance>,
}

#[derive(Debug, Deserialize)]
pub struct PortsData {
    #[serde(default)]
    pub ports: Vec<Port>,
}

#[derive(Debug, Deserialize)]
pub struct StaffData {
    #[serde(default)]
    pub staff: Vec<StaffMember>,
}
