mod common;

use common::{case, drain, hijack_chat, pilot_context, vessel, wear_quote, Failure, FakeGame};
use shipping_copilot::autopilot::{Autopilot, RunTrigger};
use shipping_copilot::broadcast::events;
use shipping_copilot::chat_watch::ChatWatcher;
use shipping_copilot::models::{AllianceChatEntry, AllianceMember};
use shipping_copilot::pilots::captain_blackbeard::hijack_cases;
use shipping_copilot::pilots::PilotKind;
use shipping_copilot::storage::{AutopilotSettings, CaseOutcome, LookupCache, SettingsStore};
use shipping_copilot::CopilotError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    game: Arc<FakeGame>,
    autopilot: Autopilot,
}

fn harness(configure: impl FnOnce(&mut AutopilotSettings)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let game = FakeGame::shared();

    let settings_store = SettingsStore::load(&dir.path().join("autopilot-1001.json"));
    let mut settings = AutopilotSettings::default();
    configure(&mut settings);
    settings_store.update(settings).unwrap();

    let ctx = pilot_context(game.clone(), &dir.path().join("hijack_history"));
    let autopilot = Autopilot::new(ctx, Arc::new(settings_store));
    Harness { _dir: dir, game, autopilot }
}

#[tokio::test]
async fn test_yard_foreman_repairs_most_worn_within_reserve() {
    let h = harness(|s| {
        s.yard_foreman.enabled = true;
        s.yard_foreman.wear_threshold = 20.0;
        s.yard_foreman.min_cash_reserve = 100_000;
    });
    h.game.with(|s| {
        s.company.cash = 200_000;
        s.vessels = vec![
            vessel(1, Some("nlrtm"), 30.0),
            vessel(2, Some("deham"), 80.0),
            vessel(3, None, 95.0),
            vessel(4, Some("sgsin"), 10.0),
            vessel(5, Some("nlrtm"), 50.0),
        ];
        s.quote = wear_quote(&[(1, 20_000), (2, 60_000), (5, 50_000)]);
    });
    let mut updates = h.autopilot.context().broadcaster.subscribe();

    let report = h.autopilot.run(PilotKind::YardForeman, RunTrigger::Schedule).await.unwrap();

    // 80% wear first, then 50% would break the reserve
    assert!(report.acted);
    assert_eq!(h.game.cash(), 140_000);
    let repaired = h.game.with(|s| s.vessels.iter().filter(|v| v.wear == 0.0).map(|v| v.id).collect::<Vec<_>>());
    assert_eq!(repaired, vec![2]);

    let sent = drain(&mut updates);
    let repair = sent.iter().find(|e| e.event_type == events::REPAIR_COMPLETE).unwrap();
    assert_eq!(repair.data["count"], 1);
    assert_eq!(repair.data["total_cost"], 60_000);
}

#[tokio::test]
async fn test_yard_foreman_idle_without_worn_vessels() {
    let h = harness(|s| s.yard_foreman.enabled = true);
    h.game.with(|s| s.vessels = vec![vessel(1, Some("nlrtm"), 2.0)]);

    let report = h.autopilot.run(PilotKind::YardForeman, RunTrigger::Schedule).await.unwrap();

    assert!(!report.acted);
    assert_eq!(h.game.calls("get_maintenance_quote"), 0);
}

#[tokio::test]
async fn test_harbormaster_buys_within_limits() {
    let h = harness(|s| {
        s.harbormaster.enabled = true;
        s.harbormaster.amount = 10;
        s.harbormaster.max_price = 2_000;
        s.harbormaster.min_cash_reserve = 500_000;
    });
    let mut updates = h.autopilot.context().broadcaster.subscribe();

    let report = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Schedule).await.unwrap();

    assert!(report.acted);
    assert_eq!(h.game.cash(), 990_000);
    let sent = drain(&mut updates);
    let purchase = sent.iter().find(|e| e.event_type == events::ANCHOR_PURCHASED).unwrap();
    assert_eq!(purchase.data["amount"], 10);
    assert_eq!(purchase.data["cost"], 10_000);

    // Points are now under construction, the next run waits
    let second = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Schedule).await.unwrap();
    assert!(!second.acted);
    assert_eq!(h.game.calls("purchase_anchor_points"), 1);
}

#[tokio::test]
async fn test_harbormaster_respects_price_cap_and_reserve() {
    let h = harness(|s| {
        s.harbormaster.enabled = true;
        s.harbormaster.max_price = 500;
    });
    let report = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Schedule).await.unwrap();
    assert!(!report.acted);

    let h = harness(|s| {
        s.harbormaster.enabled = true;
        s.harbormaster.min_cash_reserve = 999_500;
    });
    let report = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Schedule).await.unwrap();
    assert!(!report.acted);
    assert_eq!(h.game.calls("purchase_anchor_points"), 0);
}

#[tokio::test]
async fn test_blackbeard_negotiates_open_cases() {
    let h = harness(|s| {
        s.captain_blackbeard.enabled = true;
        s.captain_blackbeard.max_rounds = 1;
    });
    h.game.with(|s| {
        s.chats = vec![hijack_chat(1, 55), hijack_chat(2, 55)];
        s.cases = VecDeque::from(vec![case(55, 200_000)]);
    });

    let report = h.autopilot.run(PilotKind::CaptainBlackbeard, RunTrigger::Schedule).await.unwrap();

    assert!(report.acted);
    assert_eq!(report.summary, "case 55: paid");
    assert_eq!(h.game.calls("pay_ransom"), 1);

    // Resolved cases are skipped afterwards
    let again = h.autopilot.run(PilotKind::CaptainBlackbeard, RunTrigger::Schedule).await.unwrap();
    assert!(!again.acted);
}

#[tokio::test]
async fn test_negotiate_case_on_demand_ignores_pause() {
    let h = harness(|s| {
        s.autopilot_paused = true;
        s.captain_blackbeard.max_rounds = 1;
    });
    h.game.with(|s| s.cases = VecDeque::from(vec![case(77, 100_000)]));

    let history = h.autopilot.negotiate_case(77).await.unwrap();

    assert_eq!(history.outcome, Some(CaseOutcome::Paid { amount: 100_000, verified: true }));
}

#[tokio::test]
async fn test_pause_and_disabled_pilots_stay_idle() {
    let h = harness(|s| s.yard_foreman.enabled = true);
    h.game.with(|s| s.vessels = vec![vessel(1, Some("nlrtm"), 90.0)]);

    let status = h.autopilot.pause().unwrap();
    assert!(status.paused);
    let report = h.autopilot.run(PilotKind::YardForeman, RunTrigger::Schedule).await.unwrap();
    assert_eq!(report.summary, "autopilot is paused");
    assert_eq!(h.game.calls("get_vessels"), 0);

    h.autopilot.resume().unwrap();
    let report = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Schedule).await.unwrap();
    assert_eq!(report.summary, "pilot is disabled");

    // A manual run flies even while disabled
    let report = h.autopilot.run(PilotKind::Harbormaster, RunTrigger::Manual).await.unwrap();
    assert!(report.acted);
}

#[tokio::test]
async fn test_expired_session_is_broadcast() {
    let h = harness(|s| s.yard_foreman.enabled = true);
    h.game.with(|s| s.vessels_failure = Some(Failure::Expired));
    let mut updates = h.autopilot.context().broadcaster.subscribe();

    let result = h.autopilot.run(PilotKind::YardForeman, RunTrigger::Schedule).await;

    assert!(matches!(result, Err(CopilotError::SessionExpired)));
    let sent = drain(&mut updates);
    assert!(sent.iter().any(|e| e.event_type == events::SESSION_EXPIRED));
}

#[tokio::test]
async fn test_status_keeps_last_reports() {
    let h = harness(|s| s.yard_foreman.enabled = true);
    h.autopilot.run(PilotKind::YardForeman, RunTrigger::Schedule).await.unwrap();

    let status = h.autopilot.status();
    let yard = status.pilots.iter().find(|p| p.pilot == PilotKind::YardForeman).unwrap();
    assert!(yard.enabled);
    assert!(yard.last_report.is_some());
    let harbor = status.pilots.iter().find(|p| p.pilot == PilotKind::Harbormaster).unwrap();
    assert!(harbor.last_report.is_none());
}

#[test]
fn test_hijack_cases_are_deduplicated() {
    let chats = vec![hijack_chat(1, 5), hijack_chat(2, 6), hijack_chat(3, 5)];
    assert_eq!(hijack_cases(&chats), vec![5, 6]);
}

#[tokio::test]
async fn test_chat_watcher_primes_then_announces() {
    let game = FakeGame::shared();
    game.with(|s| {
        s.members = vec![AllianceMember { user_id: 5, company_name: "Blue Line".into(), role: "member".into() }];
        s.alliance_chat = vec![AllianceChatEntry {
            kind: "chat".into(),
            user_id: Some(5),
            message: "old".into(),
            time_created: 100,
        }];
    });
    let broadcaster = shipping_copilot::Broadcaster::new();
    let mut updates = broadcaster.subscribe();
    let watcher = ChatWatcher::new(
        game.clone(),
        broadcaster.clone(),
        Arc::new(LookupCache::new()),
        Duration::from_secs(60),
        Some(77),
    );

    let first = watcher.poll().await.unwrap();
    assert_eq!(first.new_alliance_messages, 0);
    assert!(drain(&mut updates).is_empty());

    game.with(|s| {
        s.alliance_chat.push(AllianceChatEntry {
            kind: "chat".into(),
            user_id: Some(5),
            message: "new".into(),
            time_created: 200,
        });
        s.chats = vec![hijack_chat(9, 42)];
    });

    let second = watcher.poll().await.unwrap();
    assert_eq!(second.new_alliance_messages, 1);
    assert_eq!(second.new_hijack_cases, vec![42]);

    let sent = drain(&mut updates);
    let chat = sent.iter().find(|e| e.event_type == events::ALLIANCE_CHAT).unwrap();
    assert_eq!(chat.data["messages"][0]["company_name"], "Blue Line");
    assert_eq!(chat.data["messages"][0]["message"], "new");
    assert!(sent.iter().any(|e| e.event_type == events::MESSENGER_UPDATE && e.data["unread"] == 1));
    assert!(sent.iter().any(|e| e.event_type == events::HIJACKING_DETECTED && e.data["case_id"] == 42));
}

fn chat_entry(user_id: u64, message: &str, time_created: i64) -> AllianceChatEntry {
    AllianceChatEntry {
        kind: "chat".into(),
        user_id: Some(user_id),
        message: message.into(),
        time_created,
    }
}

fn watcher_for(game: &Arc<FakeGame>, broadcaster: &shipping_copilot::Broadcaster) -> ChatWatcher {
    ChatWatcher::new(
        game.clone(),
        broadcaster.clone(),
        Arc::new(LookupCache::new()),
        Duration::from_secs(60),
        Some(77),
    )
}

#[tokio::test]
async fn test_chat_watcher_still_announces_without_member_names() {
    let game = FakeGame::shared();
    game.with(|s| s.alliance_chat = vec![chat_entry(5, "old", 100)]);
    let broadcaster = shipping_copilot::Broadcaster::new();
    let mut updates = broadcaster.subscribe();
    let watcher = watcher_for(&game, &broadcaster);
    watcher.poll().await.unwrap();

    game.with(|s| {
        s.alliance_chat.push(chat_entry(5, "new", 200));
        s.members_failure = Some(Failure::Server);
    });
    let report = watcher.poll().await.unwrap();

    assert_eq!(report.new_alliance_messages, 1);
    let sent = drain(&mut updates);
    let chat = sent.iter().find(|e| e.event_type == events::ALLIANCE_CHAT).unwrap();
    assert_eq!(chat.data["messages"][0]["message"], "new");
    assert_eq!(chat.data["messages"][0]["company_name"], "Unknown");

    // Announced once only
    game.with(|s| s.members_failure = None);
    assert_eq!(watcher.poll().await.unwrap().new_alliance_messages, 0);
}

#[tokio::test]
async fn test_chat_watcher_skips_own_posts() {
    let game = FakeGame::shared();
    let broadcaster = shipping_copilot::Broadcaster::new();
    let mut updates = broadcaster.subscribe();
    let watcher = watcher_for(&game, &broadcaster);
    watcher.poll().await.unwrap();

    watcher.note_own_post(1001, "ahoy ");
    game.with(|s| {
        s.alliance_chat.push(chat_entry(1001, "ahoy", 10));
        s.alliance_chat.push(chat_entry(5, "ahoy", 11));
    });
    let report = watcher.poll().await.unwrap();

    assert_eq!(report.new_alliance_messages, 1);
    let sent = drain(&mut updates);
    let chat = sent.iter().find(|e| e.event_type == events::ALLIANCE_CHAT).unwrap();
    assert_eq!(chat.data["messages"].as_array().unwrap().len(), 1);
    assert_eq!(chat.data["messages"][0]["user_id"], 5);

    // The same text posted again from the game itself is announced
    game.with(|s| s.alliance_chat.push(chat_entry(1001, "ahoy", 12)));
    assert_eq!(watcher.poll().await.unwrap().new_alliance_messages, 1);
}

#[tokio::test]
async fn test_chat_watcher_forgets_cases_no_longer_listed() {
    let game = FakeGame::shared();
    game.with(|s| s.chats = vec![hijack_chat(1, 42)]);
    let broadcaster = shipping_copilot::Broadcaster::new();
    let watcher = watcher_for(&game, &broadcaster);
    watcher.poll().await.unwrap();

    game.with(|s| s.chats.push(hijack_chat(2, 43)));
    assert_eq!(watcher.poll().await.unwrap().new_hijack_cases, vec![43]);
    assert!(watcher.poll().await.unwrap().new_hijack_cases.is_empty());

    // Notification deleted, then a fresh one for the same case
    game.with(|s| s.chats.clear());
    watcher.poll().await.unwrap();
    game.with(|s| s.chats = vec![hijack_chat(3, 42)]);
    assert_eq!(watcher.poll().await.unwrap().new_hijack_cases, vec![42]);
}
