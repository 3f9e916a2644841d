// Hijacking negotiation: offer, wait for the pirates' counter, repeat, then pay
use serde_json::json;
use std::fmt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::broadcast::{events, Broadcaster};
use crate::client::GameApi;
use crate::config::NegotiationConfig;
use crate::error::{CopilotError, Result};
use crate::models::HijackCase;
use crate::storage::{BlackbeardSettings, CaseHistory, CaseOutcome, HijackHistoryStore, Party};

#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationState {
    Opening,
    Offering { round: u32 },
    AwaitingCounter { round: u32, offer: i64 },
    Settling { price: i64 },
    Done(CaseOutcome),
}

impl NegotiationState {
    pub fn name(&self) -> &'static str {
        match self {
            NegotiationState::Opening => "opening",
            NegotiationState::Offering { .. } => "offering",
            NegotiationState::AwaitingCounter { .. } => "awaiting_counter",
            NegotiationState::Settling { .. } => "settling",
            NegotiationState::Done(_) => "done",
        }
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationState::Offering { round } => write!(f, "offering (round {})", round),
            NegotiationState::AwaitingCounter { round, offer } => {
                write!(f, "awaiting counter to ${} (round {})", offer, round)
            }
            NegotiationState::Settling { price } => write!(f, "settling at ${}", price),
            NegotiationState::Done(outcome) => write!(f, "done ({})", outcome.label()),
            NegotiationState::Opening => write!(f, "opening"),
        }
    }
}

/// Counter offer as a share of the current demand, rounded down, never below 1.
pub fn offer_amount(demand: i64, offer_percent: u32) -> i64 {
    let offer = (demand as i128 * offer_percent as i128) / 100;
    offer.clamp(1, i64::MAX as i128) as i64
}

/// Drives one hijacking case to an outcome. Every transition is written to
/// the case history and announced as `hijacking_update`.
pub struct Negotiator<'a> {
    api: &'a dyn GameApi,
    store: &'a HijackHistoryStore,
    broadcaster: &'a Broadcaster,
    settings: BlackbeardSettings,
    timing: NegotiationConfig,
    history: CaseHistory,
    demand: i64,
    state: NegotiationState,
    reopen_abandoned: bool,
}

impl<'a> Negotiator<'a> {
    /// Picks up the stored history of the case, if any.
    pub fn new(
        api: &'a dyn GameApi,
        store: &'a HijackHistoryStore,
        broadcaster: &'a Broadcaster,
        settings: BlackbeardSettings,
        timing: NegotiationConfig,
        case_id: u64,
    ) -> Result<Self> {
        let history = store.load(case_id)?.unwrap_or_else(|| CaseHistory::new(case_id));
        let demand = history.current_demand.unwrap_or_default();

        Ok(Self {
            api,
            store,
            broadcaster,
            settings,
            timing,
            history,
            demand,
            state: NegotiationState::Opening,
            reopen_abandoned: false,
        })
    }

    /// Allow a case abandoned over the ransom cap to be negotiated again.
    pub fn reopen_abandoned(mut self, reopen: bool) -> Self {
        self.reopen_abandoned = reopen;
        self
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn history(&self) -> &CaseHistory {
        &self.history
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, NegotiationState::Done(_))
    }

    fn case_id(&self) -> u64 {
        self.history.case_id
    }

    /// Run until the case reaches an outcome. Only an expired session is
    /// returned as an error, everything else ends the case as failed.
    pub async fn run(mut self) -> Result<CaseHistory> {
        info!("🏴‍☠️ Negotiating hijacking case {}", self.case_id());

        while !self.is_done() {
            if let Err(e) = self.step().await {
                if matches!(e, CopilotError::SessionExpired) {
                    if let Err(save_err) = self.store.save(&self.history) {
                        warn!("⚠️ Could not save case {}: {}", self.case_id(), save_err);
                    }
                    return Err(e);
                }
                warn!("⚠️ Case {} failed in state {}: {}", self.case_id(), self.state, e);
                self.finish(CaseOutcome::Failed { reason: e.to_string() })?;
            }
        }

        if let NegotiationState::Done(outcome) = &self.state {
            info!("🏴‍☠️ Case {} finished: {}", self.case_id(), outcome.label());
        }
        Ok(self.history)
    }

    /// Perform exactly one transition.
    pub async fn step(&mut self) -> Result<()> {
        debug!("🏴‍☠️ Case {} in state {}", self.case_id(), self.state);

        match self.state.clone() {
            NegotiationState::Opening => self.open().await,
            NegotiationState::Offering { round } => self.offer(round).await,
            NegotiationState::AwaitingCounter { round, offer } => self.await_counter(round, offer).await,
            NegotiationState::Settling { price } => self.settle(price).await,
            NegotiationState::Done(_) => Ok(()),
        }
    }

    async fn open(&mut self) -> Result<()> {
        match &self.history.outcome {
            Some(CaseOutcome::Abandoned { .. }) if self.reopen_abandoned => {
                info!("🏴‍☠️ Reopening abandoned case {}", self.case_id());
                self.history.outcome = None;
                self.history.resolved_at = None;
            }
            Some(outcome) if outcome.is_final() => {
                // Stored outcome stays, only the state moves on
                return self.transition(NegotiationState::Done(CaseOutcome::AlreadyResolved));
            }
            Some(outcome) => {
                info!("🏴‍☠️ Retrying case {} after {}", self.case_id(), outcome.label());
                self.history.outcome = None;
                self.history.resolved_at = None;
            }
            None => {}
        }

        let case = self.fetch_case().await?;
        if self.history.vessel_name.is_none() {
            self.history.vessel_name = case.vessel_name.clone();
        }

        if case.is_resolved() {
            let round = self.history.rounds_completed;
            self.history.record(round, Party::System, case.paid_amount, Some("case already resolved in game"));
            return self.finish(CaseOutcome::AlreadyResolved);
        }

        self.demand = case.requested_amount;
        if self.history.initial_demand.is_none() {
            self.history.initial_demand = Some(self.demand);
            self.history.record(0, Party::Pirate, Some(self.demand), Some("initial demand"));
        }
        self.history.current_demand = Some(self.demand);

        let round = self.history.rounds_completed + 1;
        self.transition(NegotiationState::Offering { round })
    }

    async fn offer(&mut self, round: u32) -> Result<()> {
        if round > self.settings.max_rounds {
            return self.transition(NegotiationState::Settling { price: self.demand });
        }

        let offer = offer_amount(self.demand, self.settings.offer_percent);
        if offer >= self.demand {
            return self.transition(NegotiationState::Settling { price: self.demand });
        }

        match self.submit_offer(offer).await {
            Ok(()) => {
                info!("🏴‍☠️ Case {} round {}: offered ${} against ${}", self.case_id(), round, offer, self.demand);
                self.history.record(round, Party::User, Some(offer), None);
                self.transition(NegotiationState::AwaitingCounter { round, offer })
            }
            Err(CopilotError::SessionExpired) => Err(CopilotError::SessionExpired),
            Err(e) => self.finish(CaseOutcome::Failed {
                reason: format!("offer submission failed: {}", e),
            }),
        }
    }

    async fn await_counter(&mut self, round: u32, offer: i64) -> Result<()> {
        let mut counter = None;

        for poll in 1..=self.timing.counter_poll_attempts {
            sleep(self.timing.counter_poll_interval()).await;

            let case = self.fetch_case().await?;
            if case.is_resolved() {
                self.history.record(round, Party::System, case.paid_amount, Some("case resolved while waiting for counter offer"));
                return self.finish(CaseOutcome::AlreadyResolved);
            }
            if case.requested_amount != self.demand {
                counter = Some(case.requested_amount);
                break;
            }
            debug!("🏴‍☠️ Case {} poll {}: no counter to ${} yet", self.case_id(), poll, offer);
        }

        match counter {
            Some(new_demand) => {
                info!("🏴‍☠️ Case {} round {}: pirates now demand ${}", self.case_id(), round, new_demand);
                self.history.record(round, Party::Pirate, Some(new_demand), None);
                self.demand = new_demand;
                self.history.current_demand = Some(new_demand);
            }
            None => {
                self.history.record(
                    round,
                    Party::System,
                    Some(self.demand),
                    Some("no counter offer, keeping current demand"),
                );
            }
        }

        self.history.rounds_completed = round;
        self.transition(NegotiationState::Offering { round: round + 1 })
    }

    async fn settle(&mut self, price: i64) -> Result<()> {
        let max_ransom = self.settings.max_ransom;
        if max_ransom > 0 && price > max_ransom {
            warn!("🏴‍☠️ Case {}: demand ${} exceeds the ${} cap, abandoning", self.case_id(), price, max_ransom);
            return self.finish(CaseOutcome::Abandoned { price, max_ransom });
        }

        let cash_before = self.api.get_company().await?.cash;
        self.history.cash_before = Some(cash_before);
        self.history.final_price = Some(price);

        if cash_before < price {
            warn!("🏴‍☠️ Case {}: ${} cash cannot cover ${} ransom", self.case_id(), cash_before, price);
            return self.finish(CaseOutcome::InsufficientFunds { price, cash: cash_before });
        }

        let round = self.history.rounds_completed;
        let reported_cash = match self.api.pay_ransom(self.case_id()).await {
            Ok(payment) if payment.success => payment.cash_after,
            Ok(_) => self.confirm_payment("payment was not accepted").await?,
            Err(CopilotError::SessionExpired) => return Err(CopilotError::SessionExpired),
            Err(e) => self.confirm_payment(&e.to_string()).await?,
        };

        if self.is_done() {
            return Ok(());
        }

        let cash_after = match reported_cash {
            Some(cash) => cash,
            None => {
                sleep(self.timing.payment_settle()).await;
                self.api.get_company().await?.cash
            }
        };
        self.history.cash_after = Some(cash_after);

        let spent = cash_before - cash_after;
        let verified = spent == price;
        if !verified {
            warn!("⚠️ Case {}: cash dropped by ${} but ransom was ${}", self.case_id(), spent, price);
            self.history.record(
                round,
                Party::System,
                Some(spent),
                Some("cash difference does not match the ransom"),
            );
        }

        info!("💰 Case {}: paid ${} ransom", self.case_id(), price);
        self.history.record(round, Party::User, Some(price), Some("ransom paid"));
        self.finish(CaseOutcome::Paid { amount: price, verified })
    }

    /// After a failed payment call, ask the game whether the money went
    /// through anyway. Ends the case as failed when it did not.
    async fn confirm_payment(&mut self, reason: &str) -> Result<Option<i64>> {
        warn!("⚠️ Case {}: ransom payment failed ({}), checking case", self.case_id(), reason);

        let case = self.api.get_hijack_case(self.case_id()).await?;
        if case.is_resolved() {
            let round = self.history.rounds_completed;
            self.history.record(round, Party::System, case.paid_amount, Some("payment reported an error but the case is resolved"));
            return Ok(None);
        }

        self.finish(CaseOutcome::Failed {
            reason: format!("ransom payment failed: {}", reason),
        })?;
        Ok(None)
    }

    async fn fetch_case(&self) -> Result<HijackCase> {
        let mut attempt = 1;
        loop {
            match self.api.get_hijack_case(self.case_id()).await {
                Ok(case) => return Ok(case),
                Err(e) if e.is_retryable() && attempt < self.timing.submit_attempts => {
                    warn!("⚠️ Fetching case {} failed (attempt {}): {}", self.case_id(), attempt, e);
                    attempt += 1;
                    sleep(self.timing.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn submit_offer(&self, offer: i64) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.api.submit_offer(self.case_id(), offer).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.timing.submit_attempts => {
                    warn!("⚠️ Offer for case {} failed (attempt {}): {}", self.case_id(), attempt, e);
                    attempt += 1;
                    sleep(self.timing.retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn transition(&mut self, next: NegotiationState) -> Result<()> {
        self.state = next;
        self.persist_and_announce()
    }

    fn finish(&mut self, outcome: CaseOutcome) -> Result<()> {
        self.history.resolve(outcome.clone());
        self.transition(NegotiationState::Done(outcome))
    }

    fn persist_and_announce(&self) -> Result<()> {
        self.store.save(&self.history)?;

        let round = match &self.state {
            NegotiationState::Offering { round } | NegotiationState::AwaitingCounter { round, .. } => *round,
            _ => self.history.rounds_completed,
        };
        let offer = match &self.state {
            NegotiationState::AwaitingCounter { offer, .. } => Some(*offer),
            _ => None,
        };
        let outcome = match &self.state {
            NegotiationState::Done(outcome) => Some(outcome),
            _ => None,
        };

        self.broadcaster.send(
            events::HIJACKING_UPDATE,
            json!({
                "case_id": self.case_id(),
                "vessel_name": self.history.vessel_name,
                "state": self.state.name(),
                "round": round,
                "demand": self.demand,
                "offer": offer,
                "outcome": outcome,
            }),
        );
        Ok(())
    }
}
