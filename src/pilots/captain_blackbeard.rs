// Captain Blackbeard: finds hijacked vessels and negotiates their release
use async_trait::async_trait;
use tracing::{info, warn};

use super::{Pilot, PilotContext, PilotKind, PilotReport};
use crate::error::{CopilotError, Result};
use crate::models::ChatSummary;
use crate::negotiation::Negotiator;
use crate::storage::AutopilotSettings;

pub struct CaptainBlackbeard;

/// Distinct hijack case ids announced in the chat list, in list order.
pub fn hijack_cases(chats: &[ChatSummary]) -> Vec<u64> {
    let mut cases = Vec::new();
    for case_id in chats.iter().filter_map(ChatSummary::hijack_case_id) {
        if !cases.contains(&case_id) {
            cases.push(case_id);
        }
    }
    cases
}

#[async_trait]
impl Pilot for CaptainBlackbeard {
    fn kind(&self) -> PilotKind {
        PilotKind::CaptainBlackbeard
    }

    fn enabled(&self, settings: &AutopilotSettings) -> bool {
        settings.captain_blackbeard.enabled
    }

    async fn fly(&self, ctx: &PilotContext, settings: &AutopilotSettings) -> Result<PilotReport> {
        let chats = ctx.api.get_chat_list().await?;
        let open_cases: Vec<u64> = hijack_cases(&chats)
            .into_iter()
            .filter(|case_id| !ctx.history.is_resolved(*case_id))
            .collect();

        if open_cases.is_empty() {
            return Ok(PilotReport::idle(self.kind(), "no open hijacking cases"));
        }
        info!("🏴‍☠️ {} open hijacking case(s)", open_cases.len());

        let mut outcomes = Vec::new();
        for case_id in open_cases {
            let negotiator = Negotiator::new(
                ctx.api.as_ref(),
                &ctx.history,
                &ctx.broadcaster,
                settings.captain_blackbeard.clone(),
                ctx.negotiation.clone(),
                case_id,
            )?;

            match negotiator.run().await {
                Ok(history) => {
                    let label = history.outcome.as_ref().map(|o| o.label()).unwrap_or("open");
                    outcomes.push(format!("case {}: {}", case_id, label));
                }
                Err(CopilotError::SessionExpired) => return Err(CopilotError::SessionExpired),
                Err(e) => {
                    warn!("⚠️ Case {} could not be negotiated: {}", case_id, e);
                    outcomes.push(format!("case {}: error", case_id));
                }
            }
        }

        Ok(PilotReport::acted(self.kind(), outcomes.join(", ")))
    }
}
