// Yard Foreman: sends worn vessels in port to repair
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::{Pilot, PilotContext, PilotKind, PilotReport};
use crate::broadcast::events;
use crate::error::Result;
use crate::models::{MaintenanceQuote, Vessel};
use crate::storage::AutopilotSettings;

pub struct YardForeman;

/// Vessels to repair, most worn first, stopping at the first one whose
/// repair would push cash below the reserve. Returns the picks and their cost.
pub fn plan_repairs<'a>(
    candidates: &[&'a Vessel],
    quote: &MaintenanceQuote,
    cash: i64,
    min_cash_reserve: i64,
) -> (Vec<&'a Vessel>, i64) {
    let mut ordered = candidates.to_vec();
    ordered.sort_by(|a, b| b.wear.total_cmp(&a.wear));

    let mut remaining = cash;
    let mut total_cost = 0;
    let mut selected = Vec::new();

    for vessel in ordered {
        let cost = match quote.cost_for(vessel.id) {
            Some(cost) if cost > 0 => cost,
            _ => continue,
        };
        if remaining - cost < min_cash_reserve {
            break;
        }
        remaining -= cost;
        total_cost += cost;
        selected.push(vessel);
    }

    (selected, total_cost)
}

#[async_trait]
impl Pilot for YardForeman {
    fn kind(&self) -> PilotKind {
        PilotKind::YardForeman
    }

    fn enabled(&self, settings: &AutopilotSettings) -> bool {
        settings.yard_foreman.enabled
    }

    async fn fly(&self, ctx: &PilotContext, settings: &AutopilotSettings) -> Result<PilotReport> {
        let config = &settings.yard_foreman;
        let vessels = ctx.api.get_vessels().await?;

        let candidates: Vec<&Vessel> = vessels
            .iter()
            .filter(|v| v.is_in_port() && v.needs_repair(config.wear_threshold))
            .collect();
        if candidates.is_empty() {
            return Ok(PilotReport::idle(self.kind(), "no vessels in port need repair"));
        }
        debug!("🔧 {} vessel(s) at or above {}% wear", candidates.len(), config.wear_threshold);

        let ids: Vec<u64> = candidates.iter().map(|v| v.id).collect();
        let quote = ctx.api.get_maintenance_quote(&ids).await?;
        let cash = ctx.api.get_company().await?.cash;

        let (selected, total_cost) = plan_repairs(&candidates, &quote, cash, config.min_cash_reserve);
        if selected.is_empty() {
            return Ok(PilotReport::idle(
                self.kind(),
                format!("cash ${} cannot cover repairs above the ${} reserve", cash, config.min_cash_reserve),
            ));
        }

        let repair_ids: Vec<u64> = selected.iter().map(|v| v.id).collect();
        let result = ctx.api.repair_vessels(&repair_ids).await?;
        if !result.success {
            return Ok(PilotReport::idle(self.kind(), "the shipyard rejected the repair order"));
        }

        let charged = if result.total_cost > 0 { result.total_cost } else { total_cost };
        info!("🔧 Repaired {} vessel(s) for ${}", selected.len(), charged);

        ctx.broadcaster.send(
            events::REPAIR_COMPLETE,
            json!({
                "count": selected.len(),
                "total_cost": charged,
                "cash_after": result.cash_after,
                "vessels": selected
                    .iter()
                    .map(|v| json!({ "id": v.id, "name": v.name, "wear": v.wear }))
                    .collect::<Vec<_>>(),
            }),
        );

        Ok(PilotReport::acted(
            self.kind(),
            format!("repaired {} vessel(s) for ${}", selected.len(), charged),
        ))
    }
}
