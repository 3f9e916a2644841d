// Persistent per-case hijacking negotiation history
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::write_json_file;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    User,
    Pirate,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationEvent {
    pub round: u32,
    pub party: Party,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseOutcome {
    Paid { amount: i64, verified: bool },
    AlreadyResolved,
    InsufficientFunds { price: i64, cash: i64 },
    Abandoned { price: i64, max_ransom: i64 },
    Failed { reason: String },
}

impl CaseOutcome {
    /// Final outcomes stop the autopilot from touching the case again;
    /// the others are retried on the next run.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            CaseOutcome::Paid { .. } | CaseOutcome::AlreadyResolved | CaseOutcome::Abandoned { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Paid { .. } => "paid",
            CaseOutcome::AlreadyResolved => "already_resolved",
            CaseOutcome::InsufficientFunds { .. } => "insufficient_funds",
            CaseOutcome::Abandoned { .. } => "abandoned",
            CaseOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseHistory {
    pub case_id: u64,
    #[serde(default)]
    pub vessel_name: Option<String>,
    #[serde(default)]
    pub initial_demand: Option<i64>,
    #[serde(default)]
    pub current_demand: Option<i64>,
    #[serde(default)]
    pub events: Vec<NegotiationEvent>,
    #[serde(default)]
    pub rounds_completed: u32,
    #[serde(default)]
    pub final_price: Option<i64>,
    #[serde(default)]
    pub cash_before: Option<i64>,
    #[serde(default)]
    pub cash_after: Option<i64>,
    #[serde(default)]
    pub outcome: Option<CaseOutcome>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl CaseHistory {
    pub fn new(case_id: u64) -> Self {
        Self {
            case_id,
            vessel_name: None,
            initial_demand: None,
            current_demand: None,
            events: Vec::new(),
            rounds_completed: 0,
            final_price: None,
            cash_before: None,
            cash_after: None,
            outcome: None,
            started_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn record(&mut self, round: u32, party: Party, amount: Option<i64>, note: Option<&str>) {
        self.events.push(NegotiationEvent {
            round,
            party,
            amount,
            note: note.map(str::to_string),
            at: Utc::now(),
        });
    }

    pub fn resolve(&mut self, outcome: CaseOutcome) {
        self.outcome = Some(outcome);
        self.resolved_at = Some(Utc::now());
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.as_ref().is_some_and(CaseOutcome::is_final)
    }
}

/// One JSON file per case under `hijack_history/<user_id>/`.
pub struct HijackHistoryStore {
    dir: PathBuf,
}

impl HijackHistoryStore {
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    fn case_path(&self, case_id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", case_id))
    }

    pub fn load(&self, case_id: u64) -> Result<Option<CaseHistory>> {
        let path = self.case_path(case_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, history: &CaseHistory) -> Result<()> {
        write_json_file(&self.case_path(history.case_id), history)
    }

    pub fn is_resolved(&self, case_id: u64) -> bool {
        matches!(self.load(case_id), Ok(Some(history)) if history.is_resolved())
    }

    /// Every stored case, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<CaseHistory>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut cases = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(crate::error::CopilotError::from)
                .and_then(|content| Ok(serde_json::from_str::<CaseHistory>(&content)?));
            match parsed {
                Ok(history) => cases.push(history),
                Err(e) => warn!("⚠️ Skipping unreadable case file {}: {}", path.display(), e),
            }
        }

        cases.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(cases)
    }
}
