use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::api_broker::ApiRequestBroker;
use super::GameApi;
use crate::config::ApiConfig;
use crate::error::{CopilotError, Result};
use crate::models::*;
use crate::SESSION_COOKIE_NAME;

/// Cookie-authenticated client for the Shipping Manager REST API.
#[derive(Clone)]
pub struct GameClient {
    base_url: String,
    broker: ApiRequestBroker,
    debug_mode: bool,
}

impl GameClient {
    pub fn new(cookie: &str, api: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(crate::USER_AGENT));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE_NAME, cookie))
                .map_err(|_| CopilotError::Session("cookie contains invalid characters".into()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            broker: ApiRequestBroker::new(client, api.broker_settings()),
            debug_mode: false,
        })
    }

    pub fn set_debug_mode(&mut self, debug: bool) {
        self.debug_mode = debug;
    }

    /// POST to an endpoint and return the raw JSON body.
    pub async fn post_value(&self, endpoint: &str, body: Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let request_body = if self.debug_mode { Some(body.to_string()) } else { None };

        let response = self.broker.request(&url, body).await?;

        if let Some(request_body) = request_body {
            debug!(target: "api", "POST {} body={} -> {} {}", endpoint, request_body, response.status,
                response.body.chars().take(500).collect::<String>());
        }

        interpret_response(endpoint, response.status, &response.body)
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<ApiEnvelope<T>> {
        let value = self.post_value(endpoint, body).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Map status code and body of a game response onto the crate's errors.
pub fn interpret_response(endpoint: &str, status: u16, body: &str) -> Result<Value> {
    if status == 401 || status == 403 {
        return Err(CopilotError::SessionExpired);
    }
    if !(200..300).contains(&status) {
        return Err(CopilotError::Api {
            endpoint: endpoint.to_string(),
            status,
            body: body.chars().take(200).collect(),
        });
    }

    let value: Value = serde_json::from_str(body)?;
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(CopilotError::Game {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        });
    }
    Ok(value)
}

fn cash_of(user: &Option<UserSnapshot>) -> Option<i64> {
    user.as_ref().and_then(|u| u.cash)
}

#[async_trait]
impl GameApi for GameClient {
    // User operations
    async fn get_user_settings(&self) -> Result<User> {
        let value = self.post_value("user/get-user-settings", json!({})).await?;
        let response: UserSettingsResponse = serde_json::from_value(value)?;
        if response.user.id == 0 {
            return Err(CopilotError::SessionExpired);
        }
        Ok(response.user)
    }

    async fn get_company(&self) -> Result<Company> {
        let envelope: ApiEnvelope<CompanyData> = self.post("user/get-company", json!({})).await?;
        Ok(envelope.data.company)
    }

    // Vessel operations
    async fn get_vessels(&self) -> Result<Vec<Vessel>> {
        let envelope: ApiEnvelope<VesselsData> =
            self.post("vessel/get-all-user-vessels", json!({ "include_routes": true })).await?;
        Ok(envelope.data.user_vessels)
    }

    async fn get_maintenance_quote(&self, vessel_ids: &[u64]) -> Result<MaintenanceQuote> {
        let envelope: ApiEnvelope<MaintenanceQuote> =
            self.post("maintenance/get", json!({ "vessel_ids": vessel_ids })).await?;
        Ok(envelope.data)
    }

    async fn repair_vessels(&self, vessel_ids: &[u64]) -> Result<RepairResult> {
        let envelope: ApiEnvelope<RepairData> = self
            .post("maintenance/do-wear-maintenance-bulk", json!({ "vessel_ids": vessel_ids }))
            .await?;
        Ok(RepairResult {
            success: envelope.data.success,
            total_cost: envelope.data.total_cost,
            cash_after: cash_of(&envelope.user),
        })
    }

    // Anchor point operations
    async fn get_anchor_info(&self) -> Result<AnchorInfo> {
        let envelope: ApiEnvelope<AnchorInfo> = self.post("anchor-point/get-info", json!({})).await?;
        Ok(envelope.data)
    }

    async fn purchase_anchor_points(&self, amount: u32) -> Result<AnchorPurchase> {
        let envelope: ApiEnvelope<AnchorPurchaseData> = self
            .post("anchor-point/purchase-anchor-points", json!({ "amount": amount }))
            .await?;
        Ok(AnchorPurchase {
            success: envelope.data.success,
            amount: envelope.data.amount,
            cost: envelope.data.cost,
            cash_after: cash_of(&envelope.user),
        })
    }

    // Messenger operations
    async fn get_chat_list(&self) -> Result<Vec<ChatSummary>> {
        let envelope: ApiEnvelope<Vec<ChatSummary>> = self.post("messenger/get-chat-list", json!({})).await?;
        Ok(envelope.data)
    }

    async fn get_chat(&self, chat_id: u64) -> Result<Vec<ChatMessage>> {
        let envelope: ApiEnvelope<ChatData> =
            self.post("messenger/get-chat", json!({ "chat_id": chat_id })).await?;
        Ok(envelope.data.messages)
    }

    async fn send_message(&self, recipient: u64, subject: &str, body: &str) -> Result<()> {
        self.post_value(
            "messenger/send-message",
            json!({ "recipient": recipient, "subject": subject, "body": body }),
        )
        .await?;
        Ok(())
    }

    async fn delete_chats(&self, chat_ids: &[u64]) -> Result<()> {
        self.post_value("messenger/delete-chat", json!({ "chat_ids": chat_ids })).await?;
        Ok(())
    }

    // Hijacking operations
    async fn get_hijack_case(&self, case_id: u64) -> Result<HijackCase> {
        let envelope: ApiEnvelope<HijackCase> =
            self.post("hijacking/get-case", json!({ "case_id": case_id })).await?;
        let mut case = envelope.data;
        case.case_id = case_id;
        Ok(case)
    }

    async fn submit_offer(&self, case_id: u64, amount: i64) -> Result<()> {
        self.post_value("hijacking/submit-offer", json!({ "case_id": case_id, "amount": amount }))
            .await?;
        Ok(())
    }

    async fn pay_ransom(&self, case_id: u64) -> Result<RansomPayment> {
        let envelope: ApiEnvelope<PaymentData> =
            self.post("hijacking/pay", json!({ "case_id": case_id })).await?;
        Ok(RansomPayment {
            success: envelope.data.success,
            cash_after: cash_of(&envelope.user),
        })
    }

    // Alliance operations
    async fn get_alliance_chat(&self, alliance_id: u64) -> Result<Vec<AllianceChatEntry>> {
        let envelope: ApiEnvelope<ChatFeedData> =
            self.post("alliance/get-chat-feed", json!({ "alliance_id": alliance_id })).await?;
        Ok(envelope.data.chat_feed)
    }

    async fn post_alliance_chat(&self, alliance_id: u64, text: &str) -> Result<()> {
        self.post_value("alliance/post-chat", json!({ "alliance_id": alliance_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn get_alliance_members(&self, alliance_id: u64) -> Result<Vec<AllianceMember>> {
        let envelope: ApiEnvelope<MembersData> = self
            .post("alliance/get-alliance-members", json!({ "alliance_id": alliance_id }))
            .await?;
        Ok(envelope.data.members)
    }

    async fn get_open_alliances(&self, offset: u32, limit: u32) -> Result<Vec<Alliance>> {
        let envelope: ApiEnvelope<AlliancesData> = self
            .post("alliance/get-open-alliances", json!({ "offset": offset, "limit": limit }))
            .await?;
        Ok(envelope.data.alliances)
    }

    // Coop operations
    async fn get_coop_data(&self) -> Result<CoopData> {
        let envelope: ApiEnvelope<CoopData> = self.post("coop/get-coop-data", json!({})).await?;
        Ok(envelope.data)
    }

    async fn send_coop(&self, user_id: u64, vessels: u32) -> Result<Value> {
        let value = self
            .post_value("route/depart-coop", json!({ "user_id": user_id, "vessels": vessels }))
            .await?;
        Ok(value.get("data").cloned().unwrap_or(Value::Null))
    }

    // Harbor and staff operations
    async fn get_ports(&self) -> Result<Vec<Port>> {
        let envelope: ApiEnvelope<PortsData> = self.post("game/index", json!({})).await?;
        Ok(envelope.data.ports)
    }

    async fn get_staff(&self) -> Result<Vec<StaffMember>> {
        let envelope: ApiEnvelope<StaffData> = self.post("staff/get-user-staff", json!({})).await?;
        Ok(envelope.data.staff)
    }

    async fn change_salary(&self, staff_type: &str, raise: bool) -> Result<Value> {
        let endpoint = if raise { "staff/raise-salary" } else { "staff/reduce-salary" };
        let value = self.post_value(endpoint, json!({ "type": staff_type })).await?;
        Ok(value.get("data").cloned().unwrap_or(Value::Null))
    }
}
