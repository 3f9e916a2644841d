// Client module - Shipping Manager game API client
pub mod api;
pub mod api_broker;

pub use api::GameClient;
pub use api_broker::{ApiRequestBroker, BrokerSettings};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::*;

/// Everything the pilots and HTTP routes need from the game.
///
/// [`GameClient`] talks to the real API; tests substitute scripted fakes.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn get_user_settings(&self) -> Result<User>;
    async fn get_company(&self) -> Result<Company>;

    async fn get_vessels(&self) -> Result<Vec<Vessel>>;
    async fn get_maintenance_quote(&self, vessel_ids: &[u64]) -> Result<MaintenanceQuote>;
    async fn repair_vessels(&self, vessel_ids: &[u64]) -> Result<RepairResult>;

    async fn get_anchor_info(&self) -> Result<AnchorInfo>;
    async fn purchase_anchor_points(&self, amount: u32) -> Result<AnchorPurchase>;

    async fn get_chat_list(&self) -> Result<Vec<ChatSummary>>;
    async fn get_chat(&self, chat_id: u64) -> Result<Vec<ChatMessage>>;
    async fn send_message(&self, recipient: u64, subject: &str, body: &str) -> Result<()>;
    async fn delete_chats(&self, chat_ids: &[u64]) -> Result<()>;

    async fn get_hijack_case(&self, case_id: u64) -> Result<HijackCase>;
    async fn submit_offer(&self, case_id: u64, amount: i64) -> Result<()>;
    async fn pay_ransom(&self, case_id: u64) -> Result<RansomPayment>;

    async fn get_alliance_chat(&self, alliance_id: u64) -> Result<Vec<AllianceChatEntry>>;
    async fn post_alliance_chat(&self, alliance_id: u64, text: &str) -> Result<()>;
    async fn get_alliance_members(&self, alliance_id: u64) -> Result<Vec<AllianceMember>>;
    async fn get_open_alliances(&self, offset: u32, limit: u32) -> Result<Vec<Alliance>>;

    async fn get_coop_data(&self) -> Result<CoopData>;
    async fn send_coop(&self, user_id: u64, vessels: u32) -> Result<Value>;

    async fn get_ports(&self) -> Result<Vec<Port>>;
    async fn get_staff(&self) -> Result<Vec<StaffMember>>;
    async fn change_salary(&self, staff_type: &str, raise: bool) -> Result<Value>;
}
