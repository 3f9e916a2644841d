// Chat watcher - turns new alliance messages, unread mail and hijack
// notifications into live UI events
use serde::Serialize;
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::broadcast::{events, Broadcaster};
use crate::client::GameApi;
use crate::error::Result;
use crate::models::AllianceChatEntry;
use crate::storage::LookupCache;
use crate::views::{cached_members, enrich_alliance_chat};

/// Own posts remembered until they show up in the feed.
const MAX_PENDING_ECHOES: usize = 50;

#[derive(Debug, Default)]
struct WatchCursor {
    primed: bool,
    last_alliance_message: i64,
    unread: Option<usize>,
    seen_cases: HashSet<u64>,
}

/// What one poll produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchReport {
    pub new_alliance_messages: usize,
    pub unread: usize,
    pub new_hijack_cases: Vec<u64>,
}

pub struct ChatWatcher {
    api: Arc<dyn GameApi>,
    broadcaster: Broadcaster,
    cache: Arc<LookupCache>,
    lookup_ttl: Duration,
    alliance_id: Option<u64>,
    cursor: Mutex<WatchCursor>,
    own_posts: std::sync::Mutex<VecDeque<(u64, String)>>,
}

impl ChatWatcher {
    pub fn new(
        api: Arc<dyn GameApi>,
        broadcaster: Broadcaster,
        cache: Arc<LookupCache>,
        lookup_ttl: Duration,
        alliance_id: Option<u64>,
    ) -> Self {
        Self {
            api,
            broadcaster,
            cache,
            lookup_ttl,
            alliance_id,
            cursor: Mutex::new(WatchCursor::default()),
            own_posts: std::sync::Mutex::new(VecDeque::new()),
        }
    }

    /// Remember a post that was already broadcast so the feed copy of it is
    /// not announced a second time.
    pub fn note_own_post(&self, user_id: u64, text: &str) {
        let mut posts = self.own_posts.lock().unwrap_or_else(|e| e.into_inner());
        if posts.len() == MAX_PENDING_ECHOES {
            posts.pop_front();
        }
        posts.push_back((user_id, text.trim().to_string()));
    }

    pub fn forget_own_post(&self, user_id: u64, text: &str) {
        let mut posts = self.own_posts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pos) = posts.iter().position(|(id, t)| *id == user_id && t == text.trim()) {
            posts.remove(pos);
        }
    }

    /// True (and consumed) when the entry echoes a post noted earlier.
    fn is_own_echo(&self, entry: &AllianceChatEntry) -> bool {
        let Some(user_id) = entry.user_id else {
            return false;
        };
        let mut posts = self.own_posts.lock().unwrap_or_else(|e| e.into_inner());
        match posts.iter().position(|(id, t)| *id == user_id && t == entry.message.trim()) {
            Some(pos) => {
                posts.remove(pos);
                true
            }
            None => false,
        }
    }

    /// The first poll only records what already exists.
    pub async fn poll(&self) -> Result<WatchReport> {
        let mut cursor = self.cursor.lock().await;
        let announce = cursor.primed;
        let mut report = WatchReport::default();

        if let Some(alliance_id) = self.alliance_id {
            let feed = self.api.get_alliance_chat(alliance_id).await?;
            let newest = feed.iter().map(|e| e.time_created).max().unwrap_or(cursor.last_alliance_message);

            let fresh: Vec<_> = feed
                .into_iter()
                .filter(|e| e.time_created > cursor.last_alliance_message)
                .filter(|e| !self.is_own_echo(e))
                .collect();

            if announce && !fresh.is_empty() {
                report.new_alliance_messages = fresh.len();
                let members = match cached_members(self.api.as_ref(), &self.cache, alliance_id, self.lookup_ttl).await {
                    Ok(members) => members,
                    Err(e) => {
                        warn!("⚠️ Alliance member lookup failed, names unavailable: {}", e);
                        Vec::new()
                    }
                };
                let messages = enrich_alliance_chat(fresh, &members);
                self.broadcaster.send(events::ALLIANCE_CHAT, json!({ "messages": messages }));
            }
            cursor.last_alliance_message = cursor.last_alliance_message.max(newest);
        }

        let chats = self.api.get_chat_list().await?;
        let unread = chats.iter().filter(|c| c.new).count();
        report.unread = unread;
        if announce && cursor.unread != Some(unread) {
            self.broadcaster.send(events::MESSENGER_UPDATE, json!({ "unread": unread }));
        }
        cursor.unread = Some(unread);

        for chat in &chats {
            let Some(case_id) = chat.hijack_case_id() else {
                continue;
            };
            if !cursor.seen_cases.insert(case_id) || !announce {
                continue;
            }
            info!("🏴‍☠️ New hijacking case {} detected", case_id);
            report.new_hijack_cases.push(case_id);
            self.broadcaster.send(
                events::HIJACKING_DETECTED,
                json!({
                    "case_id": case_id,
                    "chat_id": chat.id,
                    "vessel_name": chat.hijacked_vessel_name(),
                }),
            );
        }

        // Cases whose notification is gone can be forgotten
        let listed: HashSet<u64> = chats.iter().filter_map(|c| c.hijack_case_id()).collect();
        cursor.seen_cases.retain(|id| listed.contains(id));

        if !cursor.primed {
            debug!("💬 Chat watcher primed ({} unread)", unread);
            cursor.primed = true;
        }
        Ok(report)
    }
}
