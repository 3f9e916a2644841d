// Alliance indexer - full-text search over the game's open alliances
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{info, warn};

use crate::client::GameApi;
use crate::error::Result;
use crate::models::Alliance;
use crate::storage::write_json_file;

pub const PAGE_SIZE: u32 = 50;
pub const MAX_PAGES: u32 = 200;

/// Lowercase, split on anything that is not alphanumeric, drop empties.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn alliance_tokens(alliance: &Alliance) -> Vec<String> {
    let mut tokens = tokenize(&alliance.name);
    tokens.extend(tokenize(&alliance.description));
    tokens.extend(tokenize(&alliance.language));
    tokens.sort();
    tokens.dedup();
    tokens
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub refreshed_at: DateTime<Utc>,
    pub alliances: Vec<Alliance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub alliance: Alliance,
    pub score: u32,
}

#[derive(Default)]
struct IndexData {
    alliances: Vec<Alliance>,
    tokens: Vec<Vec<String>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl IndexData {
    fn build(alliances: Vec<Alliance>, refreshed_at: DateTime<Utc>) -> Self {
        let tokens = alliances.iter().map(alliance_tokens).collect();
        Self {
            alliances,
            tokens,
            refreshed_at: Some(refreshed_at),
        }
    }
}

pub struct AllianceIndex {
    snapshot_path: PathBuf,
    data: RwLock<IndexData>,
}

impl AllianceIndex {
    pub fn new(snapshot_path: &Path) -> Self {
        Self {
            snapshot_path: snapshot_path.to_path_buf(),
            data: RwLock::new(IndexData::default()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexData> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn replace(&self, data: IndexData) {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = data;
    }

    pub fn len(&self) -> usize {
        self.read().alliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.read().refreshed_at
    }

    /// Restore the last persisted index. Returns the number of alliances.
    pub fn load_snapshot(&self) -> Result<usize> {
        if !self.snapshot_path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.snapshot_path)?;
        let snapshot: IndexSnapshot = serde_json::from_str(&content)?;
        let count = snapshot.alliances.len();

        self.replace(IndexData::build(snapshot.alliances, snapshot.refreshed_at));
        info!("🔎 Loaded {} alliances from index snapshot", count);
        Ok(count)
    }

    /// Page through the open alliances, rebuild the index and persist it.
    pub async fn refresh(&self, api: &dyn GameApi) -> Result<usize> {
        let mut alliances: Vec<Alliance> = Vec::new();

        for page in 0..MAX_PAGES {
            let batch = api.get_open_alliances(page * PAGE_SIZE, PAGE_SIZE).await?;
            let short_page = batch.len() < PAGE_SIZE as usize;
            alliances.extend(batch);
            if short_page {
                break;
            }
        }

        // Listings can shift between pages
        alliances.sort_by_key(|a| a.id);
        alliances.dedup_by_key(|a| a.id);

        let refreshed_at = Utc::now();
        let snapshot = IndexSnapshot {
            refreshed_at,
            alliances,
        };
        if let Err(e) = write_json_file(&self.snapshot_path, &snapshot) {
            warn!("⚠️ Could not persist alliance index: {}", e);
        }

        let count = snapshot.alliances.len();
        self.replace(IndexData::build(snapshot.alliances, refreshed_at));
        info!("🔎 Indexed {} open alliances", count);
        Ok(count)
    }

    /// Every query token must prefix-match a token of the alliance. Exact
    /// matches score 2, prefix matches 1. Ties go to bigger alliances, then name.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let data = self.read();
        let mut hits: Vec<SearchHit> = data
            .alliances
            .iter()
            .zip(&data.tokens)
            .filter_map(|(alliance, tokens)| {
                score(&query_tokens, tokens).map(|score| SearchHit {
                    alliance: alliance.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.alliance.members.cmp(&a.alliance.members))
                .then_with(|| a.alliance.name.cmp(&b.alliance.name))
        });
        hits.truncate(limit);
        hits
    }
}

fn score(query_tokens: &[String], tokens: &[String]) -> Option<u32> {
    let mut total = 0;
    for query in query_tokens {
        if tokens.iter().any(|t| t == query) {
            total += 2;
        } else if tokens.iter().any(|t| t.starts_with(query.as_str())) {
            total += 1;
        } else {
            return None;
        }
    }
    Some(total)
}
