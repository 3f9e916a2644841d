// Per-user autopilot settings, editable from the web UI
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};
use tracing::{info, warn};

use super::write_json_file;
use crate::error::{CopilotError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotSettings {
    /// Global pause for every pilot
    pub autopilot_paused: bool,
    pub yard_foreman: YardForemanSettings,
    pub harbormaster: HarbormasterSettings,
    pub captain_blackbeard: BlackbeardSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YardForemanSettings {
    pub enabled: bool,
    /// Wear percentage at which a vessel is sent to repair
    pub wear_threshold: f64,
    /// Cash that must remain after paying for repairs
    pub min_cash_reserve: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarbormasterSettings {
    pub enabled: bool,
    /// Anchor points per purchase (the game sells 1 or 10)
    pub amount: u32,
    /// Highest price per anchor point; 0 means no cap
    pub max_price: i64,
    pub min_cash_reserve: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackbeardSettings {
    pub enabled: bool,
    /// Each counter offer is this share of the current demand
    pub offer_percent: u32,
    pub max_rounds: u32,
    /// Never pay more than this; 0 means no cap
    pub max_ransom: i64,
}

impl Default for YardForemanSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wear_threshold: 10.0,
            min_cash_reserve: 0,
        }
    }
}

impl Default for HarbormasterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            amount: 1,
            max_price: 0,
            min_cash_reserve: 0,
        }
    }
}

impl Default for BlackbeardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            offer_percent: 25,
            max_rounds: 2,
            max_ransom: 0,
        }
    }
}

impl AutopilotSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(CopilotError::InvalidInput(msg.to_string()));

        let yard = &self.yard_foreman;
        if !(0.0..=100.0).contains(&yard.wear_threshold) {
            return invalid("yard_foreman.wear_threshold must be between 0 and 100");
        }
        if yard.min_cash_reserve < 0 {
            return invalid("yard_foreman.min_cash_reserve must not be negative");
        }

        let harbor = &self.harbormaster;
        if harbor.amount != 1 && harbor.amount != 10 {
            return invalid("harbormaster.amount must be 1 or 10");
        }
        if harbor.max_price < 0 || harbor.min_cash_reserve < 0 {
            return invalid("harbormaster prices must not be negative");
        }

        let blackbeard = &self.captain_blackbeard;
        if !(1..=99).contains(&blackbeard.offer_percent) {
            return invalid("captain_blackbeard.offer_percent must be between 1 and 99");
        }
        if !(1..=10).contains(&blackbeard.max_rounds) {
            return invalid("captain_blackbeard.max_rounds must be between 1 and 10");
        }
        if blackbeard.max_ransom < 0 {
            return invalid("captain_blackbeard.max_ransom must not be negative");
        }

        Ok(())
    }
}

pub struct SettingsStore {
    storage_path: PathBuf,
    current: RwLock<AutopilotSettings>,
}

impl SettingsStore {
    /// Load settings, falling back to defaults when the file is missing or broken.
    pub fn load(storage_path: &Path) -> Self {
        let settings = match Self::read_from_disk(storage_path) {
            Ok(Some(settings)) => {
                info!("💾 Loaded autopilot settings from {}", storage_path.display());
                settings
            }
            Ok(None) => AutopilotSettings::default(),
            Err(e) => {
                warn!("⚠️ Failed to load autopilot settings: {}", e);
                warn!("💾 Starting with default autopilot settings");
                AutopilotSettings::default()
            }
        };

        Self {
            storage_path: storage_path.to_path_buf(),
            current: RwLock::new(settings),
        }
    }

    fn read_from_disk(path: &Path) -> Result<Option<AutopilotSettings>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let settings: AutopilotSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(Some(settings))
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> AutopilotSettings {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AutopilotSettings> {
        match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Validate, persist, then swap in the new settings.
    pub fn update(&self, settings: AutopilotSettings) -> Result<AutopilotSettings> {
        settings.validate()?;

        let mut guard = self.write_guard();
        write_json_file(&self.storage_path, &settings)?;
        *guard = settings.clone();

        info!("💾 Autopilot settings saved");
        Ok(settings)
    }

    /// Read, flip and persist the pause flag under one write lock.
    pub fn set_paused(&self, paused: bool) -> Result<AutopilotSettings> {
        let mut guard = self.write_guard();
        let mut settings = guard.clone();
        settings.autopilot_paused = paused;
        write_json_file(&self.storage_path, &settings)?;
        *guard = settings.clone();

        info!("💾 Autopilot {}", if paused { "paused" } else { "resumed" });
        Ok(settings)
    }
}
