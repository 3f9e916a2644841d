use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::secret::CookieSealer;
use crate::error::{CopilotError, Result};
use crate::storage::write_json_file;

/// One entry of `sessions.json`. The cookie is always stored sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub cookie: String,
    /// Unix seconds of the last save
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub login_method: String,
}

pub struct SessionStore {
    path: PathBuf,
    sealer: CookieSealer,
}

impl SessionStore {
    pub fn new(path: &Path, sealer: CookieSealer) -> Self {
        Self {
            path: path.to_path_buf(),
            sealer,
        }
    }

    pub fn sealer(&self) -> &CookieSealer {
        &self.sealer
    }

    /// All stored sessions keyed by user id. A missing file is an empty map.
    pub fn load(&self) -> Result<BTreeMap<u64, StoredSession>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let raw: BTreeMap<String, StoredSession> = serde_json::from_str(&content)?;

        let mut sessions = BTreeMap::new();
        for (key, session) in raw {
            match key.parse::<u64>() {
                Ok(user_id) => {
                    sessions.insert(user_id, session);
                }
                Err(_) => warn!("⚠️ Ignoring session entry with invalid user id '{}'", key),
            }
        }
        Ok(sessions)
    }

    fn write(&self, sessions: &BTreeMap<u64, StoredSession>) -> Result<()> {
        let raw: BTreeMap<String, &StoredSession> =
            sessions.iter().map(|(id, s)| (id.to_string(), s)).collect();
        write_json_file(&self.path, &raw)
    }

    pub fn save_session(&self, user_id: u64, cookie: &str, company_name: &str, login_method: &str) -> Result<()> {
        if cookie.trim().is_empty() {
            return Err(CopilotError::InvalidInput("cookie must not be empty".into()));
        }

        let mut sessions = self.load()?;
        let sealed = self.sealer.seal(user_id, cookie)?;

        sessions.insert(
            user_id,
            StoredSession {
                cookie: sealed,
                timestamp: Utc::now().timestamp(),
                company_name: company_name.to_string(),
                login_method: login_method.to_string(),
            },
        );
        self.write(&sessions)?;

        info!("🔐 Session saved for {} (user {})", company_name, user_id);
        Ok(())
    }

    /// Remove a session and its keychain entry. Returns whether it existed.
    pub fn remove(&self, user_id: u64) -> Result<bool> {
        let mut sessions = self.load()?;
        let Some(removed) = sessions.remove(&user_id) else {
            return Ok(false);
        };

        if let Err(e) = self.sealer.forget(&removed.cookie) {
            warn!("⚠️ Could not delete keychain entry for user {}: {}", user_id, e);
        }
        self.write(&sessions)?;

        info!("🔐 Session removed for user {}", user_id);
        Ok(true)
    }

    pub fn list_newest_first(&self) -> Result<Vec<(u64, StoredSession)>> {
        let mut sessions: Vec<_> = self.load()?.into_iter().collect();
        sessions.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        Ok(sessions)
    }

    pub fn unseal(&self, session: &StoredSession) -> Result<Option<String>> {
        self.sealer.unseal(&session.cookie)
    }
}
