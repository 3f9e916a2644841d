mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{case, hijack_chat, pilot_context, vessel, FakeGame};
use shipping_copilot::api::{build_router, ApiState};
use shipping_copilot::autopilot::Autopilot;
use shipping_copilot::chat_watch::ChatWatcher;
use shipping_copilot::config::CopilotConfig;
use shipping_copilot::indexer::AllianceIndex;
use shipping_copilot::models::{AllianceChatEntry, AllianceMember, Port};
use shipping_copilot::storage::{LookupCache, SettingsStore};

struct TestApp {
    _dir: TempDir,
    game: Arc<FakeGame>,
    watcher: Arc<ChatWatcher>,
    router: Router,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("index.html"), "<h1>copilot</h1>").unwrap();

    let game = FakeGame::shared();
    let settings = Arc::new(SettingsStore::load(&dir.path().join("autopilot-1001.json")));
    let autopilot = Arc::new(Autopilot::new(
        pilot_context(game.clone(), &dir.path().join("hijack_history")),
        settings,
    ));

    let mut config = CopilotConfig::default();
    config.server.public_dir = public.to_string_lossy().into_owned();

    let cache = Arc::new(LookupCache::new());
    let watcher = Arc::new(ChatWatcher::new(
        game.clone(),
        autopilot.context().broadcaster.clone(),
        cache.clone(),
        Duration::from_secs(60),
        Some(77),
    ));

    let user = game.with(|s| s.user.clone());
    let state = ApiState::new(
        game.clone(),
        autopilot,
        cache,
        Arc::new(AllianceIndex::new(&dir.path().join("alliance_index.json"))),
        config,
        user,
    )
    .with_watcher(watcher.clone());

    TestApp {
        _dir: dir,
        game,
        watcher,
        router: build_router(Arc::new(state)),
    }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_and_status() {
    let app = app();

    let (status, body) = call(&app.router, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = call(&app.router, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 1001);
    assert_eq!(body["company_name"], "Test Shipping");
    assert_eq!(body["paused"], false);
}

#[tokio::test]
async fn test_settings_round_trip_and_validation() {
    let app = app();

    let (_, mut settings) = call(&app.router, "GET", "/api/settings", None).await;
    settings["harbormaster"]["enabled"] = json!(true);
    let (status, saved) = call(&app.router, "POST", "/api/settings", Some(settings.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["harbormaster"]["enabled"], true);

    settings["captain_blackbeard"]["max_rounds"] = json!(50);
    let (status, body) = call(&app.router, "POST", "/api/settings", Some(settings)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("max_rounds"));
}

#[tokio::test]
async fn test_pause_resume_and_run() {
    let app = app();

    let (status, body) = call(&app.router, "POST", "/api/autopilot/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paused"], true);

    let (status, body) = call(&app.router, "POST", "/api/autopilot/run/harbormaster", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pilot"], "harbormaster");
    assert_eq!(body["acted"], true);

    let (status, _) = call(&app.router, "POST", "/api/autopilot/run/admiral", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app.router, "POST", "/api/autopilot/resume", None).await;
    assert_eq!(body["paused"], false);
}

#[tokio::test]
async fn test_alliance_chat_is_enriched() {
    let app = app();
    app.game.with(|s| {
        s.members = vec![AllianceMember { user_id: 5, company_name: "Blue Line".into(), role: "member".into() }];
        s.alliance_chat = vec![
            AllianceChatEntry { kind: "chat".into(), user_id: Some(5), message: "ahoy".into(), time_created: 1 },
            AllianceChatEntry { kind: "chat".into(), user_id: Some(6), message: "hi".into(), time_created: 2 },
        ];
    });

    let (status, body) = call(&app.router, "GET", "/api/alliance/chat", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alliance_id"], 77);
    assert_eq!(body["messages"][0]["company_name"], "Blue Line");
    assert_eq!(body["messages"][1]["company_name"], "Unknown");
}

#[tokio::test]
async fn test_alliance_post_validation() {
    let app = app();

    let (status, _) = call(&app.router, "POST", "/api/alliance/chat", Some(json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "x".repeat(1001);
    let (status, _) = call(&app.router, "POST", "/api/alliance/chat", Some(json!({ "text": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.game.calls("post_alliance_chat"), 0);

    let (status, _) = call(&app.router, "POST", "/api/alliance/chat", Some(json!({ "text": "ahoy" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.game.calls("post_alliance_chat"), 1);
}

#[tokio::test]
async fn test_own_alliance_post_is_broadcast_once() {
    let app = app();
    app.watcher.poll().await.unwrap();

    let (status, _) = call(&app.router, "POST", "/api/alliance/chat", Some(json!({ "text": "ahoy" }))).await;
    assert_eq!(status, StatusCode::OK);

    let report = app.watcher.poll().await.unwrap();
    assert_eq!(report.new_alliance_messages, 0);
}

#[tokio::test]
async fn test_alliance_chat_without_alliance_is_not_found() {
    let app = app();
    app.game.with(|s| s.company.alliance_id = None);

    let (status, _) = call(&app.router, "GET", "/api/alliance/chat", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messenger_marks_hijack_chats() {
    let app = app();
    app.game.with(|s| {
        s.chats = vec![
            hijack_chat(1, 55),
            shipping_copilot::models::ChatSummary { id: 2, subject: Some("Hello".into()), ..Default::default() },
        ];
    });

    let (status, body) = call(&app.router, "GET", "/api/messenger/chats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["hijack_case_id"], 55);
    assert_eq!(body[1]["hijack_case_id"], Value::Null);

    // A game-side rejection surfaces as an upstream failure
    let (status, body) = call(&app.router, "GET", "/api/messenger/chats/99", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("chat_not_found"));

    let (status, body) = call(&app.router, "POST", "/api/messenger/delete", Some(json!({ "chat_ids": [2] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (status, _) = call(&app.router, "POST", "/api/messenger/send", Some(json!({ "recipient": 5, "subject": "", "body": "hi" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_harbor_map_view() {
    let app = app();
    app.game.with(|s| {
        s.ports = vec![Port { code: "nlrtm".into(), name: "Rotterdam".into(), ..Port::default() }];
        s.vessels = vec![vessel(1, Some("nlrtm"), 50.0), vessel(2, None, 5.0)];
    });

    let (status, body) = call(&app.router, "GET", "/api/harbor-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ports"][0]["name"], "Rotterdam");
    assert_eq!(body["totals"]["at_sea"], 1);
    assert_eq!(body["totals"]["needing_repair"], 1);

    // Ports come from the cache on the second call
    call(&app.router, "GET", "/api/harbor-map", None).await;
    assert_eq!(app.game.calls("get_ports"), 1);
}

#[tokio::test]
async fn test_anchor_coop_and_staff_inputs() {
    let app = app();

    let (status, _) = call(&app.router, "POST", "/api/anchor/purchase", Some(json!({ "amount": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app.router, "POST", "/api/anchor/purchase", Some(json!({ "amount": 10 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cost"], 10_000);

    let (status, _) = call(&app.router, "POST", "/api/coop/send", Some(json!({ "user_id": 5, "vessels": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app.router, "POST", "/api/coop/send", Some(json!({ "user_id": 5, "vessels": 3 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["departed"], 3);

    let (status, _) = call(&app.router, "POST", "/api/staff/salary", Some(json!({ "staff_type": "cfo", "action": "double" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&app.router, "POST", "/api/staff/salary", Some(json!({ "staff_type": "cfo", "action": "raise" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["raised"], true);
}

#[tokio::test]
async fn test_hijacking_case_routes() {
    let app = app();
    app.game.with(|s| s.cases = VecDeque::from(vec![case(31, 80_000)]));

    let (status, _) = call(&app.router, "GET", "/api/hijacking/cases/31", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app.router, "POST", "/api/hijacking/cases/31/negotiate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["kind"], "paid");

    let (_, body) = call(&app.router, "GET", "/api/hijacking/cases", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (status, body) = call(&app.router, "GET", "/api/hijacking/cases/31", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["case_id"], 31);
}

#[tokio::test]
async fn test_search_and_static_fallback() {
    let app = app();

    let (status, body) = call(&app.router, "GET", "/api/alliance/search?q=blue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>copilot</h1>");
}
