// Pilots: the autopilot routines that act on the player's behalf
pub mod yard_foreman;
pub mod harbormaster;
pub mod captain_blackbeard;

pub use yard_foreman::YardForeman;
pub use harbormaster::Harbormaster;
pub use captain_blackbeard::CaptainBlackbeard;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::client::GameApi;
use crate::config::NegotiationConfig;
use crate::error::{CopilotError, Result};
use crate::storage::{AutopilotSettings, HijackHistoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PilotKind {
    YardForeman,
    Harbormaster,
    CaptainBlackbeard,
}

impl PilotKind {
    pub const ALL: [PilotKind; 3] = [
        PilotKind::YardForeman,
        PilotKind::Harbormaster,
        PilotKind::CaptainBlackbeard,
    ];

    /// Identifier used in routes, schedules and settings
    pub fn name(&self) -> &'static str {
        match self {
            PilotKind::YardForeman => "yard_foreman",
            PilotKind::Harbormaster => "harbormaster",
            PilotKind::CaptainBlackbeard => "captain_blackbeard",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PilotKind::YardForeman => "Yard Foreman",
            PilotKind::Harbormaster => "Harbormaster",
            PilotKind::CaptainBlackbeard => "Captain Blackbeard",
        }
    }
}

impl fmt::Display for PilotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for PilotKind {
    type Err = CopilotError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        PilotKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| CopilotError::NotFound(format!("unknown pilot '{}'", s)))
    }
}

/// What a pilot run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotReport {
    pub pilot: PilotKind,
    pub acted: bool,
    pub summary: String,
}

impl PilotReport {
    pub fn acted(pilot: PilotKind, summary: impl Into<String>) -> Self {
        Self { pilot, acted: true, summary: summary.into() }
    }

    pub fn idle(pilot: PilotKind, summary: impl Into<String>) -> Self {
        Self { pilot, acted: false, summary: summary.into() }
    }
}

/// Shared handles every pilot flies with.
#[derive(Clone)]
pub struct PilotContext {
    pub api: Arc<dyn GameApi>,
    pub broadcaster: Broadcaster,
    pub history: Arc<HijackHistoryStore>,
    pub negotiation: NegotiationConfig,
}

#[async_trait]
pub trait Pilot: Send + Sync {
    fn kind(&self) -> PilotKind;

    fn enabled(&self, settings: &AutopilotSettings) -> bool;

    async fn fly(&self, ctx: &PilotContext, settings: &AutopilotSettings) -> Result<PilotReport>;
}

/// One instance of every pilot.
pub fn all_pilots() -> Vec<Box<dyn Pilot>> {
    vec![
        Box::new(YardForeman),
        Box::new(Harbormaster),
        Box::new(CaptainBlackbeard),
    ]
}
