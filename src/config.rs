use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::client::BrokerSettings;
use crate::error::{CopilotError, Result};

pub const APP_DIR_NAME: &str = "ShippingManagerCoPilot";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub caching: CachingConfig,
    pub schedule: ScheduleConfig,
    pub negotiation: NegotiationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind; localhost-only by default
    pub host: String,
    pub port: u16,
    /// Directory with the prebuilt web UI, relative to the working directory
    pub public_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set (error, warn, info, debug, trace)
    pub level: String,
    /// Log every game API request and response
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Minimum spacing between two game API requests
    pub min_request_interval_ms: u64,
    pub request_timeout_seconds: u64,
    /// Upper bound for the exponential backoff after HTTP 429
    pub max_backoff_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachingConfig {
    /// TTL for company data and alliance member lookups
    pub lookup_ttl_seconds: u64,
    /// TTL for the port list, which rarely changes
    pub port_ttl_seconds: u64,
}

/// Cron expressions with a leading seconds field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub yard_foreman: String,
    pub harbormaster: String,
    pub captain_blackbeard: String,
    pub chat_watch: String,
    pub alliance_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Attempts per offer submission before the case is given up
    pub submit_attempts: u32,
    pub retry_delay_seconds: u64,
    /// How often to look for the pirates' counter offer after each offer
    pub counter_poll_attempts: u32,
    pub counter_poll_interval_seconds: u64,
    /// Wait before re-reading cash when the payment response carries none
    pub payment_settle_seconds: u64,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 12345,
                public_dir: "public".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                debug_mode: false,
            },
            api: ApiConfig {
                base_url: crate::API_BASE_URL.to_string(),
                min_request_interval_ms: 250,
                request_timeout_seconds: 30,
                max_backoff_seconds: 60,
            },
            caching: CachingConfig {
                lookup_ttl_seconds: 60,
                port_ttl_seconds: 3600,
            },
            schedule: ScheduleConfig {
                yard_foreman: "0 */15 * * * *".to_string(),
                harbormaster: "0 */10 * * * *".to_string(),
                captain_blackbeard: "30 */2 * * * *".to_string(),
                chat_watch: "*/30 * * * * *".to_string(),
                alliance_index: "0 5 * * * *".to_string(),
            },
            negotiation: NegotiationConfig::default(),
        }
    }
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            submit_attempts: 3,
            retry_delay_seconds: 5,
            counter_poll_attempts: 6,
            counter_poll_interval_seconds: 10,
            payment_settle_seconds: 2,
        }
    }
}

impl ApiConfig {
    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            min_interval: Duration::from_millis(self.min_request_interval_ms),
            timeout: Duration::from_secs(self.request_timeout_seconds),
            max_backoff: Duration::from_secs(self.max_backoff_seconds),
            ..BrokerSettings::default()
        }
    }
}

impl NegotiationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn counter_poll_interval(&self) -> Duration {
        Duration::from_secs(self.counter_poll_interval_seconds)
    }

    pub fn payment_settle(&self) -> Duration {
        Duration::from_secs(self.payment_settle_seconds)
    }
}

impl CopilotConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            info!("📋 Loading configuration from {}", config_path.display());
            let config_str = fs::read_to_string(config_path)?;
            let config: CopilotConfig = toml::from_str(&config_str)?;
            Ok(config)
        } else {
            info!("📋 Creating default configuration at {}", config_path.display());
            let config = CopilotConfig::default();
            config.save(config_path)?;
            info!("💡 Edit {} to customize the copilot", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    /// `DEBUG_MODE=true` forces debug logging regardless of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("DEBUG_MODE") {
            if value.eq_ignore_ascii_case("true") || value == "1" {
                self.logging.debug_mode = true;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(CopilotError::Config("server.host must not be empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(CopilotError::Config("server.port must be greater than 0".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(CopilotError::Config("api.base_url must be an http(s) URL".to_string()));
        }
        if self.api.min_request_interval_ms == 0 {
            return Err(CopilotError::Config("api.min_request_interval_ms must be greater than 0".to_string()));
        }
        if self.api.request_timeout_seconds == 0 {
            return Err(CopilotError::Config("api.request_timeout_seconds must be greater than 0".to_string()));
        }

        if self.negotiation.submit_attempts == 0 {
            return Err(CopilotError::Config("negotiation.submit_attempts must be at least 1".to_string()));
        }

        for (name, expression) in self.schedule.jobs() {
            cron::Schedule::from_str(expression)
                .map_err(|e| CopilotError::Config(format!("schedule.{} is not a valid cron expression: {}", name, e)))?;
        }

        info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("   🌐 Listening on {}:{}", self.server.host, self.server.port);
        info!("   🐛 Debug mode: {}", self.logging.debug_mode);
        info!("   ⏱️  API spacing: {}ms", self.api.min_request_interval_ms);
        for (name, expression) in self.schedule.jobs() {
            info!("   ⏰ {}: {}", name, expression);
        }
    }
}

impl ScheduleConfig {
    pub fn jobs(&self) -> [(&'static str, &str); 5] {
        [
            ("yard_foreman", self.yard_foreman.as_str()),
            ("harbormaster", self.harbormaster.as_str()),
            ("captain_blackbeard", self.captain_blackbeard.as_str()),
            ("chat_watch", self.chat_watch.as_str()),
            ("alliance_index", self.alliance_index.as_str()),
        ]
    }
}

/// Locations of everything the copilot keeps on disk.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// CLI override first, then `<local data dir>/ShippingManagerCoPilot/userdata`.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        let root = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
                .join("userdata"),
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.root.join("settings")
    }

    pub fn config_file(&self) -> PathBuf {
        self.settings_dir().join("copilot.toml")
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.settings_dir().join("sessions.json")
    }

    pub fn autopilot_settings_file(&self, user_id: u64) -> PathBuf {
        self.settings_dir().join(format!("autopilot-{}.json", user_id))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn hijack_history_dir(&self, user_id: u64) -> PathBuf {
        self.root.join("hijack_history").join(user_id.to_string())
    }

    pub fn alliance_index_file(&self) -> PathBuf {
        self.root.join("cache").join("alliance_index.json")
    }
}
