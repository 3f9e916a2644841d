// Enriched views the UI renders: harbor map, alliance chat and messenger
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::client::GameApi;
use crate::error::Result;
use crate::models::{AllianceChatEntry, AllianceMember, ChatSummary, Company, Port, Vessel};
use crate::storage::LookupCache;

pub const UNKNOWN_COMPANY: &str = "Unknown";

#[derive(Debug, Clone, Serialize)]
pub struct VesselPin {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub wear: f64,
    pub needs_repair: bool,
    pub destination: Option<String>,
}

impl VesselPin {
    fn from_vessel(vessel: &Vessel, wear_threshold: f64) -> Self {
        Self {
            id: vessel.id,
            name: vessel.name.clone(),
            status: vessel.status.clone(),
            wear: vessel.wear,
            needs_repair: vessel.needs_repair(wear_threshold),
            destination: vessel.route_destination.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortBerth {
    pub code: String,
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub vessels: Vec<VesselPin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarborTotals {
    pub vessels: usize,
    pub in_port: usize,
    pub at_sea: usize,
    pub needing_repair: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarborMap {
    pub ports: Vec<PortBerth>,
    pub at_sea: Vec<VesselPin>,
    pub totals: HarborTotals,
}

/// Join vessels onto the ports they are docked in. Ports without vessels
/// are left out, vessels not in port are listed under `at_sea`.
pub fn build_harbor_map(ports: &[Port], vessels: &[Vessel], wear_threshold: f64) -> HarborMap {
    let port_index: HashMap<&str, &Port> = ports.iter().map(|p| (p.code.as_str(), p)).collect();

    let mut berths: BTreeMap<String, PortBerth> = BTreeMap::new();
    let mut at_sea = Vec::new();
    let mut totals = HarborTotals {
        vessels: vessels.len(),
        ..HarborTotals::default()
    };

    for vessel in vessels {
        let pin = VesselPin::from_vessel(vessel, wear_threshold);
        if pin.needs_repair {
            totals.needing_repair += 1;
        }

        let docked_at = vessel.current_port_code.as_deref().filter(|_| vessel.is_in_port());
        let Some(code) = docked_at else {
            totals.at_sea += 1;
            at_sea.push(pin);
            continue;
        };

        totals.in_port += 1;
        berths
            .entry(code.to_string())
            .or_insert_with(|| match port_index.get(code) {
                Some(port) => PortBerth {
                    code: port.code.clone(),
                    name: port.name.clone(),
                    country: port.country.clone(),
                    lat: port.lat,
                    lon: port.lon,
                    vessels: Vec::new(),
                },
                // Port missing from the game index, still show the vessels
                None => PortBerth {
                    code: code.to_string(),
                    name: code.to_string(),
                    country: String::new(),
                    lat: 0.0,
                    lon: 0.0,
                    vessels: Vec::new(),
                },
            })
            .vessels
            .push(pin);
    }

    let mut ports: Vec<PortBerth> = berths.into_values().collect();
    ports.sort_by(|a, b| b.vessels.len().cmp(&a.vessels.len()).then_with(|| a.code.cmp(&b.code)));

    HarborMap { ports, at_sea, totals }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllianceChatView {
    #[serde(flatten)]
    pub entry: AllianceChatEntry,
    pub company_name: String,
}

pub fn enrich_alliance_chat(entries: Vec<AllianceChatEntry>, members: &[AllianceMember]) -> Vec<AllianceChatView> {
    let names: HashMap<u64, &str> = members
        .iter()
        .map(|m| (m.user_id, m.company_name.as_str()))
        .collect();

    entries
        .into_iter()
        .map(|entry| {
            let company_name = entry
                .user_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNKNOWN_COMPANY)
                .to_string();
            AllianceChatView { entry, company_name }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    #[serde(flatten)]
    pub chat: ChatSummary,
    pub hijack_case_id: Option<u64>,
}

pub fn enrich_chats(chats: Vec<ChatSummary>) -> Vec<ChatView> {
    chats
        .into_iter()
        .map(|chat| ChatView {
            hijack_case_id: chat.hijack_case_id(),
            chat,
        })
        .collect()
}

// Cached lookups shared by the routes and the chat watcher

pub async fn cached_ports(api: &dyn GameApi, cache: &LookupCache, ttl: Duration) -> Result<Vec<Port>> {
    cache.get_or_fetch("ports", ttl, || api.get_ports()).await
}

pub async fn cached_company(api: &dyn GameApi, cache: &LookupCache, ttl: Duration) -> Result<Company> {
    cache.get_or_fetch("company", ttl, || api.get_company()).await
}

pub async fn cached_members(
    api: &dyn GameApi,
    cache: &LookupCache,
    alliance_id: u64,
    ttl: Duration,
) -> Result<Vec<AllianceMember>> {
    let key = format!("alliance_members:{}", alliance_id);
    cache
        .get_or_fetch(&key, ttl, || api.get_alliance_members(alliance_id))
        .await
}
