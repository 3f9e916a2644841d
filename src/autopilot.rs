// Autopilot - owns the pilots and serializes every run
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use crate::broadcast::events;
use crate::error::{CopilotError, Result};
use crate::negotiation::Negotiator;
use crate::pilots::{all_pilots, Pilot, PilotContext, PilotKind, PilotReport};
use crate::storage::{AutopilotSettings, CaseHistory, SettingsStore};

/// Who asked for a pilot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    /// Cron tick; honours the global pause and the pilot's enabled flag
    Schedule,
    /// Explicit request from the UI; runs regardless of both
    Manual,
}

#[derive(Debug, Clone, Serialize)]
pub struct PilotStatus {
    pub pilot: PilotKind,
    pub title: &'static str,
    pub enabled: bool,
    pub last_report: Option<PilotReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutopilotStatus {
    pub paused: bool,
    pub pilots: Vec<PilotStatus>,
}

pub struct Autopilot {
    ctx: PilotContext,
    settings: Arc<SettingsStore>,
    pilots: Vec<Box<dyn Pilot>>,
    run_lock: AsyncMutex<()>,
    last_reports: Mutex<HashMap<PilotKind, PilotReport>>,
}

impl Autopilot {
    pub fn new(ctx: PilotContext, settings: Arc<SettingsStore>) -> Self {
        Self {
            ctx,
            settings,
            pilots: all_pilots(),
            run_lock: AsyncMutex::new(()),
            last_reports: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &PilotContext {
        &self.ctx
    }

    pub fn settings(&self) -> AutopilotSettings {
        self.settings.get()
    }

    pub async fn run(&self, kind: PilotKind, trigger: RunTrigger) -> Result<PilotReport> {
        let pilot = self
            .pilots
            .iter()
            .find(|p| p.kind() == kind)
            .ok_or_else(|| CopilotError::NotFound(format!("pilot {}", kind.name())))?;

        let _guard = self.run_lock.lock().await;
        let settings = self.settings.get();

        if trigger == RunTrigger::Schedule {
            if settings.autopilot_paused {
                return Ok(PilotReport::idle(kind, "autopilot is paused"));
            }
            if !pilot.enabled(&settings) {
                return Ok(PilotReport::idle(kind, "pilot is disabled"));
            }
        }

        info!("🧭 {} taking the helm", kind);
        match pilot.fly(&self.ctx, &settings).await {
            Ok(report) => {
                if report.acted {
                    info!("🧭 {}: {}", kind, report.summary);
                } else {
                    info!("🧭 {} idle: {}", kind, report.summary);
                }
                self.remember(report.clone());
                Ok(report)
            }
            Err(e) => Err(self.handle_failure(kind.title(), e)),
        }
    }

    /// Negotiate one case right away. Ignores the pause but still waits for
    /// any running pilot. Cases abandoned over the ransom cap are reopened.
    pub async fn negotiate_case(&self, case_id: u64) -> Result<CaseHistory> {
        let _guard = self.run_lock.lock().await;
        let settings = self.settings.get();

        let negotiator = Negotiator::new(
            self.ctx.api.as_ref(),
            &self.ctx.history,
            &self.ctx.broadcaster,
            settings.captain_blackbeard,
            self.ctx.negotiation.clone(),
            case_id,
        )?
        .reopen_abandoned(true);

        negotiator
            .run()
            .await
            .map_err(|e| self.handle_failure("Captain Blackbeard", e))
    }

    pub fn pause(&self) -> Result<AutopilotStatus> {
        self.settings.set_paused(true)?;
        info!("⏸️ Autopilot paused");
        Ok(self.announce_status())
    }

    pub fn resume(&self) -> Result<AutopilotStatus> {
        self.settings.set_paused(false)?;
        info!("▶️ Autopilot resumed");
        Ok(self.announce_status())
    }

    /// Validate and store new settings, then tell the UI.
    pub fn update_settings(&self, settings: AutopilotSettings) -> Result<AutopilotSettings> {
        let saved = self.settings.update(settings)?;
        self.ctx
            .broadcaster
            .send(events::SETTINGS_UPDATE, serde_json::to_value(&saved)?);
        Ok(saved)
    }

    pub fn status(&self) -> AutopilotStatus {
        let settings = self.settings.get();
        let reports = match self.last_reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        AutopilotStatus {
            paused: settings.autopilot_paused,
            pilots: self
                .pilots
                .iter()
                .map(|pilot| PilotStatus {
                    pilot: pilot.kind(),
                    title: pilot.kind().title(),
                    enabled: pilot.enabled(&settings),
                    last_report: reports.get(&pilot.kind()).cloned(),
                })
                .collect(),
        }
    }

    fn announce_status(&self) -> AutopilotStatus {
        let status = self.status();
        match serde_json::to_value(&status) {
            Ok(data) => self.ctx.broadcaster.send(events::AUTOPILOT_STATUS, data),
            Err(e) => warn!("⚠️ Could not serialize autopilot status: {}", e),
        }
        status
    }

    fn remember(&self, report: PilotReport) {
        let mut reports = match self.last_reports.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        reports.insert(report.pilot, report);
    }

    fn handle_failure(&self, who: &str, e: CopilotError) -> CopilotError {
        if matches!(e, CopilotError::SessionExpired) {
            error!("🔐 Session expired during {} run", who);
            self.ctx.broadcaster.send(
                events::SESSION_EXPIRED,
                json!({ "message": "The game session expired. Log in again and restart the copilot." }),
            );
        } else {
            warn!("⚠️ {} failed: {}", who, e);
        }
        e
    }
}
