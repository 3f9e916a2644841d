//! HTTP server setup: router, static file serving, and API routes.

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::state::ApiState;
use super::{alliance, coop, harbor, hijacking, messenger, staff, system, ws};

/// Every `/api` route, `/ws` and the static UI as fallback.
pub fn build_router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(system::health))
        .route("/status", get(system::status))
        .route("/settings", get(system::get_settings).post(system::update_settings))
        .route("/autopilot/pause", post(system::pause))
        .route("/autopilot/resume", post(system::resume))
        .route("/autopilot/run/{pilot}", post(system::run_pilot))
        .route("/alliance/chat", get(alliance::get_chat).post(alliance::post_chat))
        .route("/alliance/search", get(alliance::search))
        .route("/messenger/chats", get(messenger::list_chats))
        .route("/messenger/chats/{id}", get(messenger::get_chat))
        .route("/messenger/send", post(messenger::send))
        .route("/messenger/delete", post(messenger::delete))
        .route("/coop", get(coop::get_coop))
        .route("/coop/send", post(coop::send))
        .route("/harbor-map", get(harbor::harbor_map))
        .route("/anchor", get(harbor::anchor_info))
        .route("/anchor/purchase", post(harbor::purchase_anchor))
        .route("/staff", get(staff::list_staff))
        .route("/staff/salary", post(staff::change_salary))
        .route("/hijacking/cases", get(hijacking::list_cases))
        .route("/hijacking/cases/{id}", get(hijacking::get_case))
        .route("/hijacking/cases/{id}/negotiate", post(hijacking::negotiate));

    let public_dir = ServeDir::new(&state.config.server.public_dir);

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(ws::ws_handler))
        .fallback_service(public_dir)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given address.
///
/// Returns a handle that resolves when the server shuts down. The caller
/// passes a `tokio::sync::watch::Receiver<bool>` for graceful shutdown.
pub async fn start_http_server(
    bind: SocketAddr,
    state: Arc<ApiState>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("🌐 HTTP server listening on http://{}", bind);

    let handle = tokio::spawn(async move {
        let mut shutdown = shutdown_rx;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|v| *v).await;
            })
            .await
            .ok();
    });

    Ok(handle)
}
