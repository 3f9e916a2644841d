// Scripted in-memory game used by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use shipping_copilot::broadcast::{BroadcastEvent, Broadcaster};
use shipping_copilot::config::NegotiationConfig;
use shipping_copilot::error::{CopilotError, Result};
use shipping_copilot::models::*;
use shipping_copilot::pilots::PilotContext;
use shipping_copilot::storage::HijackHistoryStore;
use shipping_copilot::GameApi;

/// Failure the fake can be told to return.
#[derive(Debug, Clone)]
pub enum Failure {
    Expired,
    Game(&'static str),
    Server,
}

impl Failure {
    fn into_error(self, endpoint: &str) -> CopilotError {
        match self {
            Failure::Expired => CopilotError::SessionExpired,
            Failure::Game(message) => CopilotError::Game {
                endpoint: endpoint.to_string(),
                message: message.to_string(),
            },
            Failure::Server => CopilotError::Api {
                endpoint: endpoint.to_string(),
                status: 500,
                body: "internal error".to_string(),
            },
        }
    }
}

pub struct FakeState {
    pub user: User,
    pub company: Company,
    pub vessels: Vec<Vessel>,
    pub quote: MaintenanceQuote,
    pub repair_success: bool,
    pub anchor: AnchorInfo,
    pub chats: Vec<ChatSummary>,
    pub messages: HashMap<u64, Vec<ChatMessage>>,
    /// Case responses served front to back; the last one repeats
    pub cases: VecDeque<HijackCase>,
    pub case_failures: VecDeque<Failure>,
    pub offer_failures: VecDeque<Failure>,
    pub pay_failure: Option<Failure>,
    /// Mark the case paid even though the payment call fails
    pub resolve_on_failed_pay: bool,
    /// Amount taken from cash on payment, defaults to the current demand
    pub ransom_charge: Option<i64>,
    pub report_cash_after_payment: bool,
    pub alliance_chat: Vec<AllianceChatEntry>,
    pub members: Vec<AllianceMember>,
    pub alliances: Vec<Alliance>,
    pub coop: CoopData,
    pub ports: Vec<Port>,
    pub staff: Vec<StaffMember>,
    pub vessels_failure: Option<Failure>,
    pub members_failure: Option<Failure>,
    pub calls: Vec<String>,
    pub offers: Vec<i64>,
}

pub struct FakeGame {
    state: Mutex<FakeState>,
}

impl FakeGame {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                user: User {
                    id: 1001,
                    company_name: "Test Shipping".into(),
                    cash: Some(1_000_000),
                },
                company: Company {
                    id: 1001,
                    company_name: "Test Shipping".into(),
                    cash: 1_000_000,
                    alliance_id: Some(77),
                    difficulty: None,
                },
                vessels: Vec::new(),
                quote: MaintenanceQuote::default(),
                repair_success: true,
                anchor: AnchorInfo {
                    price: 1_000,
                    pending_amount: 0,
                    anchor_points: 5,
                },
                chats: Vec::new(),
                messages: HashMap::new(),
                cases: VecDeque::new(),
                case_failures: VecDeque::new(),
                offer_failures: VecDeque::new(),
                pay_failure: None,
                resolve_on_failed_pay: false,
                ransom_charge: None,
                report_cash_after_payment: true,
                alliance_chat: Vec::new(),
                members: Vec::new(),
                alliances: Vec::new(),
                coop: CoopData::default(),
                ports: Vec::new(),
                staff: Vec::new(),
                vessels_failure: None,
                members_failure: None,
                calls: Vec::new(),
                offers: Vec::new(),
            }),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adjust the script.
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self, name: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| c.as_str() == name).count())
    }

    pub fn offers(&self) -> Vec<i64> {
        self.with(|s| s.offers.clone())
    }

    pub fn cash(&self) -> i64 {
        self.with(|s| s.company.cash)
    }

    fn record(&self, name: &str) {
        self.with(|s| s.calls.push(name.to_string()));
    }

    fn current_case(state: &FakeState) -> HijackCase {
        state.cases.front().cloned().unwrap_or_default()
    }
}

pub fn case(case_id: u64, demand: i64) -> HijackCase {
    HijackCase {
        case_id,
        vessel_name: Some("MV Hostage".into()),
        requested_amount: demand,
        status: "open".into(),
        ..HijackCase::default()
    }
}

pub fn resolved_case(case_id: u64, paid: i64) -> HijackCase {
    HijackCase {
        paid_amount: Some(paid),
        status: "paid".into(),
        ..case(case_id, paid)
    }
}

pub fn hijack_chat(chat_id: u64, case_id: u64) -> ChatSummary {
    ChatSummary {
        id: chat_id,
        subject: Some("Hijacking".into()),
        body: Some("vessel_got_hijacked".into()),
        system_chat: true,
        new: true,
        values: Some(json!({ "case_id": case_id, "vessel_name": "MV Hostage" })),
        ..ChatSummary::default()
    }
}

pub fn vessel(id: u64, port: Option<&str>, wear: f64) -> Vessel {
    Vessel {
        id,
        name: format!("MV {}", id),
        status: if port.is_some() { "port".into() } else { "enroute".into() },
        current_port_code: port.map(str::to_string),
        wear,
        ..Vessel::default()
    }
}

pub fn wear_quote(prices: &[(u64, i64)]) -> MaintenanceQuote {
    MaintenanceQuote {
        vessels: prices
            .iter()
            .map(|(id, price)| VesselMaintenance {
                id: *id,
                maintenance_data: vec![MaintenanceItem {
                    kind: "wear".into(),
                    price: *price,
                }],
            })
            .collect(),
    }
}

/// Negotiation timing without any waiting.
pub fn instant_timing() -> NegotiationConfig {
    NegotiationConfig {
        submit_attempts: 3,
        retry_delay_seconds: 0,
        counter_poll_attempts: 2,
        counter_poll_interval_seconds: 0,
        payment_settle_seconds: 0,
    }
}

pub fn pilot_context(api: Arc<FakeGame>, history_dir: &std::path::Path) -> PilotContext {
    PilotContext {
        api,
        broadcaster: Broadcaster::new(),
        history: Arc::new(HijackHistoryStore::new(history_dir)),
        negotiation: instant_timing(),
    }
}

/// Everything queued on a receiver right now.
pub fn drain(receiver: &mut tokio::sync::broadcast::Receiver<BroadcastEvent>) -> Vec<BroadcastEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[async_trait]
impl GameApi for FakeGame {
    async fn get_user_settings(&self) -> Result<User> {
        self.record("get_user_settings");
        Ok(self.with(|s| s.user.clone()))
    }

    async fn get_company(&self) -> Result<Company> {
        self.record("get_company");
        Ok(self.with(|s| s.company.clone()))
    }

    async fn get_vessels(&self) -> Result<Vec<Vessel>> {
        self.record("get_vessels");
        self.with(|s| match s.vessels_failure.clone() {
            Some(failure) => Err(failure.into_error("vessel/get-all-user-vessels")),
            None => Ok(s.vessels.clone()),
        })
    }

    async fn get_maintenance_quote(&self, _vessel_ids: &[u64]) -> Result<MaintenanceQuote> {
        self.record("get_maintenance_quote");
        Ok(self.with(|s| s.quote.clone()))
    }

    async fn repair_vessels(&self, vessel_ids: &[u64]) -> Result<RepairResult> {
        self.record("repair_vessels");
        Ok(self.with(|s| {
            if !s.repair_success {
                return RepairResult::default();
            }
            let cost: i64 = vessel_ids.iter().filter_map(|id| s.quote.cost_for(*id)).sum();
            s.company.cash -= cost;
            for vessel in s.vessels.iter_mut().filter(|v| vessel_ids.contains(&v.id)) {
                vessel.wear = 0.0;
            }
            RepairResult {
                success: true,
                total_cost: cost,
                cash_after: Some(s.company.cash),
            }
        }))
    }

    async fn get_anchor_info(&self) -> Result<AnchorInfo> {
        self.record("get_anchor_info");
        Ok(self.with(|s| s.anchor.clone()))
    }

    async fn purchase_anchor_points(&self, amount: u32) -> Result<AnchorPurchase> {
        self.record("purchase_anchor_points");
        Ok(self.with(|s| {
            let cost = s.anchor.price * amount as i64;
            s.company.cash -= cost;
            s.anchor.pending_amount += amount;
            AnchorPurchase {
                success: true,
                amount,
                cost,
                cash_after: Some(s.company.cash),
            }
        }))
    }

    async fn get_chat_list(&self) -> Result<Vec<ChatSummary>> {
        self.record("get_chat_list");
        Ok(self.with(|s| s.chats.clone()))
    }

    async fn get_chat(&self, chat_id: u64) -> Result<Vec<ChatMessage>> {
        self.record("get_chat");
        self.with(|s| {
            s.messages
                .get(&chat_id)
                .cloned()
                .ok_or_else(|| CopilotError::Game {
                    endpoint: "messenger/get-chat".into(),
                    message: "chat_not_found".into(),
                })
        })
    }

    async fn send_message(&self, _recipient: u64, _subject: &str, _body: &str) -> Result<()> {
        self.record("send_message");
        Ok(())
    }

    async fn delete_chats(&self, chat_ids: &[u64]) -> Result<()> {
        self.record("delete_chats");
        self.with(|s| s.chats.retain(|c| !chat_ids.contains(&c.id)));
        Ok(())
    }

    async fn get_hijack_case(&self, case_id: u64) -> Result<HijackCase> {
        self.record("get_hijack_case");
        self.with(|s| {
            if let Some(failure) = s.case_failures.pop_front() {
                return Err(failure.into_error("hijacking/get-case"));
            }
            let mut case = if s.cases.len() > 1 {
                s.cases.pop_front().unwrap_or_default()
            } else {
                Self::current_case(s)
            };
            case.case_id = case_id;
            Ok(case)
        })
    }

    async fn submit_offer(&self, _case_id: u64, amount: i64) -> Result<()> {
        self.record("submit_offer");
        self.with(|s| {
            if let Some(failure) = s.offer_failures.pop_front() {
                return Err(failure.into_error("hijacking/submit-offer"));
            }
            s.offers.push(amount);
            Ok(())
        })
    }

    async fn pay_ransom(&self, _case_id: u64) -> Result<RansomPayment> {
        self.record("pay_ransom");
        self.with(|s| {
            let charge = s
                .ransom_charge
                .unwrap_or_else(|| Self::current_case(s).requested_amount);

            if let Some(failure) = s.pay_failure.clone() {
                if s.resolve_on_failed_pay {
                    s.company.cash -= charge;
                    let paid = resolved_case(0, charge);
                    s.cases = VecDeque::from(vec![paid]);
                }
                return Err(failure.into_error("hijacking/pay"));
            }

            s.company.cash -= charge;
            let paid = resolved_case(0, charge);
            s.cases = VecDeque::from(vec![paid]);
            Ok(RansomPayment {
                success: true,
                cash_after: s.report_cash_after_payment.then_some(s.company.cash),
            })
        })
    }

    async fn get_alliance_chat(&self, _alliance_id: u64) -> Result<Vec<AllianceChatEntry>> {
        self.record("get_alliance_chat");
        Ok(self.with(|s| s.alliance_chat.clone()))
    }

    async fn post_alliance_chat(&self, _alliance_id: u64, text: &str) -> Result<()> {
        self.record("post_alliance_chat");
        self.with(|s| {
            let user_id = s.user.id;
            let time_created = s.alliance_chat.iter().map(|e| e.time_created).max().unwrap_or(0) + 1;
            s.alliance_chat.push(AllianceChatEntry {
                kind: "chat".into(),
                user_id: Some(user_id),
                message: text.to_string(),
                time_created,
            })
        });
        Ok(())
    }

    async fn get_alliance_members(&self, _alliance_id: u64) -> Result<Vec<AllianceMember>> {
        self.record("get_alliance_members");
        self.with(|s| match s.members_failure.clone() {
            Some(failure) => Err(failure.into_error("alliance/get-members")),
            None => Ok(s.members.clone()),
        })
    }

    async fn get_open_alliances(&self, offset: u32, limit: u32) -> Result<Vec<Alliance>> {
        self.record("get_open_alliances");
        Ok(self.with(|s| {
            s.alliances
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }

    async fn get_coop_data(&self) -> Result<CoopData> {
        self.record("get_coop_data");
        Ok(self.with(|s| s.coop.clone()))
    }

    async fn send_coop(&self, user_id: u64, vessels: u32) -> Result<Value> {
        self.record("send_coop");
        Ok(json!({ "user_id": user_id, "departed": vessels }))
    }

    async fn get_ports(&self) -> Result<Vec<Port>> {
        self.record("get_ports");
        Ok(self.with(|s| s.ports.clone()))
    }

    async fn get_staff(&self) -> Result<Vec<StaffMember>> {
        self.record("get_staff");
        Ok(self.with(|s| s.staff.clone()))
    }

    async fn change_salary(&self, staff_type: &str, raise: bool) -> Result<Value> {
        self.record("change_salary");
        Ok(json!({ "type": staff_type, "raised": raise }))
    }
}
