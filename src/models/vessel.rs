use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Vessel {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// `port`, `enroute`, `anchor`, `maintenance`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current_port_code: Option<String>,
    #[serde(default)]
    pub route_destination: Option<String>,
    /// Hull wear in percent.
    #[serde(default)]
    pub wear: f64,
    #[serde(default)]
    pub vessel_model: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Vessel {
    pub fn is_in_port(&self) -> bool {
        self.status == "port" && self.current_port_code.is_some()
    }

    pub fn needs_repair(&self, wear_threshold: f64) -> bool {
        self.wear >= wear_threshold
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MaintenanceItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub price: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VesselMaintenance {
    pub id: u64,
    #[serde(default)]
    pub maintenance_data: Vec<MaintenanceItem>,
}

impl VesselMaintenance {
    /// Price of the wear repair, the only maintenance the yard foreman orders.
    pub fn wear_cost(&self) -> i64 {
        self.maintenance_data
            .iter()
            .filter(|item| item.kind == "wear")
            .map(|item| item.price)
            .sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MaintenanceQuote {
    #[serde(default)]
    pub vessels: Vec<VesselMaintenance>,
}

impl MaintenanceQuote {
    pub fn cost_for(&self, vessel_id: u64) -> Option<i64> {
        self.vessels
            .iter()
            .find(|v| v.id == vessel_id)
            .map(|v| v.wear_cost())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RepairResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub total_cost: i64,
    #[serde(default)]
    pub cash_after: Option<i64>,
}
