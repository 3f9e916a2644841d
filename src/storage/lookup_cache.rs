// In-memory TTL cache for game lookups (ports, company, alliance members)
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::Result;

#[derive(Debug, Clone)]
struct CachedLookup {
    value: Value,
    fetched_at: DateTime<Utc>,
    ttl: Duration,
}

impl CachedLookup {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => age < ttl,
            Err(_) => true,
        }
    }
}

#[derive(Default)]
pub struct LookupCache {
    entries: Mutex<HashMap<String, CachedLookup>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedLookup>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Cached value while it is younger than its TTL.
    pub fn get_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries();
        let cached = entries.get(key)?;
        if !cached.is_fresh(Utc::now()) {
            return None;
        }
        serde_json::from_value(cached.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        self.entries().insert(
            key.to_string(),
            CachedLookup {
                value,
                fetched_at: Utc::now(),
                ttl,
            },
        );
        trace!("💾 Cached {} for {}s", key, ttl.as_secs());
    }

    pub fn invalidate(&self, key: &str) {
        self.entries().remove(key);
    }

    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries();
        let initial_count = entries.len();
        entries.retain(|_, cached| cached.is_fresh(now));
        let removed = initial_count - entries.len();
        if removed > 0 {
            debug!("🧹 Cleaned up {} expired lookup cache entries", removed);
        }
        removed
    }

    /// Return the cached value or fetch, cache and return a fresh one.
    /// Fetch errors are passed through and nothing is cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get_fresh(key) {
            return Ok(cached);
        }
        let value = fetch().await?;
        self.put(key, &value, ttl);
        Ok(value)
    }
}
