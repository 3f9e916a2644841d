// Harbormaster: buys anchor points when the price and cash allow it
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{Pilot, PilotContext, PilotKind, PilotReport};
use crate::broadcast::events;
use crate::error::Result;
use crate::storage::AutopilotSettings;

pub struct Harbormaster;

#[async_trait]
impl Pilot for Harbormaster {
    fn kind(&self) -> PilotKind {
        PilotKind::Harbormaster
    }

    fn enabled(&self, settings: &AutopilotSettings) -> bool {
        settings.harbormaster.enabled
    }

    async fn fly(&self, ctx: &PilotContext, settings: &AutopilotSettings) -> Result<PilotReport> {
        let config = &settings.harbormaster;
        let anchor = ctx.api.get_anchor_info().await?;

        if anchor.pending_amount > 0 {
            return Ok(PilotReport::idle(
                self.kind(),
                format!("{} anchor point(s) still under construction", anchor.pending_amount),
            ));
        }
        if config.max_price > 0 && anchor.price > config.max_price {
            return Ok(PilotReport::idle(
                self.kind(),
                format!("price ${} is above the ${} limit", anchor.price, config.max_price),
            ));
        }

        let cost = anchor.price * config.amount as i64;
        let cash = ctx.api.get_company().await?.cash;
        if cash - cost < config.min_cash_reserve {
            return Ok(PilotReport::idle(
                self.kind(),
                format!("${} for {} point(s) would break the ${} reserve", cost, config.amount, config.min_cash_reserve),
            ));
        }

        let purchase = ctx.api.purchase_anchor_points(config.amount).await?;
        if !purchase.success {
            return Ok(PilotReport::idle(self.kind(), "the game rejected the anchor purchase"));
        }

        let amount = if purchase.amount > 0 { purchase.amount } else { config.amount };
        let paid = if purchase.cost > 0 { purchase.cost } else { cost };
        info!("⚓ Bought {} anchor point(s) for ${}", amount, paid);

        ctx.broadcaster.send(
            events::ANCHOR_PURCHASED,
            json!({
                "amount": amount,
                "price": anchor.price,
                "cost": paid,
                "cash_after": purchase.cash_after,
            }),
        );

        Ok(PilotReport::acted(self.kind(), format!("bought {} anchor point(s) for ${}", amount, paid)))
    }
}
