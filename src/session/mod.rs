// Session management: sealed cookie storage and startup resolution
pub mod secret;
pub mod store;

pub use secret::{CookieSealer, KeychainBackend, OsKeychain, SealedCookie};
pub use store::{SessionStore, StoredSession};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::{GameApi, GameClient};
use crate::config::ApiConfig;
use crate::error::{CopilotError, Result};
use crate::models::User;

/// A session cookie the game accepted.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub user: User,
    pub cookie: String,
}

/// Checks a cookie against the game.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, cookie: &str) -> Result<User>;
}

/// Validates by fetching the user settings with the cookie.
pub struct GameSessionValidator {
    api: ApiConfig,
}

impl GameSessionValidator {
    pub fn new(api: &ApiConfig) -> Self {
        Self { api: api.clone() }
    }
}

#[async_trait]
impl SessionValidator for GameSessionValidator {
    async fn validate(&self, cookie: &str) -> Result<User> {
        let client = GameClient::new(cookie, &self.api)?;
        client.get_user_settings().await
    }
}

/// `SELECTED_USER_ID` from the environment, when set and numeric.
pub fn selected_user_from_env() -> Option<u64> {
    std::env::var("SELECTED_USER_ID").ok()?.trim().parse().ok()
}

/// Find the session to run with. A selected user restricts the search to
/// that one session, otherwise the newest valid session wins.
pub async fn resolve_session(
    store: &SessionStore,
    validator: &dyn SessionValidator,
    selected_user: Option<u64>,
) -> Result<ActiveSession> {
    let mut candidates = store.list_newest_first()?;
    if candidates.is_empty() {
        return Err(CopilotError::Session(
            "no saved sessions, run `session import` first".into(),
        ));
    }

    if let Some(user_id) = selected_user {
        candidates.retain(|(id, _)| *id == user_id);
        if candidates.is_empty() {
            return Err(CopilotError::Session(format!("no saved session for user {}", user_id)));
        }
    }

    for (user_id, session) in candidates {
        let cookie = match store.unseal(&session) {
            Ok(Some(cookie)) => cookie,
            Ok(None) => {
                warn!("⚠️ Session for user {} has no stored secret, skipping", user_id);
                continue;
            }
            Err(e) => {
                warn!("⚠️ Could not unseal session for user {}: {}", user_id, e);
                continue;
            }
        };

        info!("🔐 Validating session for {} (user {})", session.company_name, user_id);
        match validator.validate(&cookie).await {
            Ok(user) if user.id != 0 => {
                if SealedCookie::classify(&session.cookie).needs_reseal() {
                    if let Err(e) = store.save_session(user_id, &cookie, &user.company_name, &session.login_method) {
                        warn!("⚠️ Could not re-seal legacy session: {}", e);
                    }
                }
                info!("✅ Logged in as {} (user {})", user.company_name, user.id);
                return Ok(ActiveSession { user, cookie });
            }
            Ok(_) => warn!("⚠️ Session for user {} returned no user id", user_id),
            Err(e) => warn!("⚠️ Session for user {} is not valid: {}", user_id, e),
        }
    }

    Err(CopilotError::Session("no valid session found".into()))
}
