//! Shared state for the HTTP API.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::autopilot::Autopilot;
use crate::broadcast::Broadcaster;
use crate::chat_watch::ChatWatcher;
use crate::client::GameApi;
use crate::config::CopilotConfig;
use crate::error::{CopilotError, Result};
use crate::indexer::AllianceIndex;
use crate::models::User;
use crate::storage::{HijackHistoryStore, LookupCache};
use crate::views::cached_company;

/// State shared across all API handlers.
pub struct ApiState {
    pub api: Arc<dyn GameApi>,
    pub autopilot: Arc<Autopilot>,
    pub broadcaster: Broadcaster,
    pub cache: Arc<LookupCache>,
    pub index: Arc<AllianceIndex>,
    pub config: CopilotConfig,
    pub user: User,
    pub watcher: Option<Arc<ChatWatcher>>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        api: Arc<dyn GameApi>,
        autopilot: Arc<Autopilot>,
        cache: Arc<LookupCache>,
        index: Arc<AllianceIndex>,
        config: CopilotConfig,
        user: User,
    ) -> Self {
        Self {
            broadcaster: autopilot.context().broadcaster.clone(),
            api,
            autopilot,
            cache,
            index,
            config,
            user,
            watcher: None,
            started_at: Instant::now(),
        }
    }

    /// Lets the chat watcher skip posts the routes already broadcast.
    pub fn with_watcher(mut self, watcher: Arc<ChatWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn lookup_ttl(&self) -> Duration {
        Duration::from_secs(self.config.caching.lookup_ttl_seconds)
    }

    pub fn port_ttl(&self) -> Duration {
        Duration::from_secs(self.config.caching.port_ttl_seconds)
    }

    pub fn history(&self) -> &HijackHistoryStore {
        &self.autopilot.context().history
    }

    /// The player's alliance, from the cached company data.
    pub async fn alliance_id(&self) -> Result<u64> {
        cached_company(self.api.as_ref(), &self.cache, self.lookup_ttl())
            .await?
            .alliance_id
            .ok_or_else(|| CopilotError::NotFound("company is not in an alliance".into()))
    }
}
