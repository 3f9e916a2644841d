// Shipping Manager CoPilot - backend entry point
// Serves the web UI, proxies the game API and flies the autopilot

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use shipping_copilot::api::{start_http_server, ApiState};
use shipping_copilot::autopilot::Autopilot;
use shipping_copilot::backup;
use shipping_copilot::chat_watch::ChatWatcher;
use shipping_copilot::config::{CopilotConfig, DataPaths};
use shipping_copilot::indexer::AllianceIndex;
use shipping_copilot::logging::init_logging;
use shipping_copilot::pilots::PilotContext;
use shipping_copilot::scheduler::default_schedule;
use shipping_copilot::session::{
    resolve_session, selected_user_from_env, CookieSealer, GameSessionValidator, SessionStore, SessionValidator,
};
use shipping_copilot::storage::{HijackHistoryStore, LookupCache, SettingsStore};
use shipping_copilot::{Broadcaster, GameApi, GameClient};

#[derive(Parser)]
#[command(name = "shipping-copilot", version, about = "Companion backend for Shipping Manager")]
struct Cli {
    /// Data directory (defaults to the platform's local data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the backend (default)
    Serve {
        #[arg(long)]
        user_id: Option<u64>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Manage saved game sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Back up or restore the data directory
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Validate a session cookie and store it sealed
    Import {
        #[arg(long)]
        cookie: String,
        #[arg(long, default_value = "manual")]
        login_method: String,
    },
    /// List saved sessions, newest first
    List,
    /// Delete a saved session and its keychain entry
    Remove { user_id: u64 },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write a zip of the data directory
    Create {
        /// Output file (defaults to SMCoPilot_Backup_<timestamp>.zip in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore a backup zip over the data directory; stop the backend first
    Restore { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = DataPaths::resolve(cli.data_dir.as_deref());

    let mut config = CopilotConfig::load_or_create(&paths.config_file())
        .with_context(|| format!("loading {}", paths.config_file().display()))?;
    config.apply_env_overrides();

    let _log_guard = init_logging(&config.logging, &paths.logs_dir())?;
    config.validate()?;

    let sessions = SessionStore::new(&paths.sessions_file(), CookieSealer::new());

    match cli.command.unwrap_or(Command::Serve { user_id: None, host: None, port: None }) {
        Command::Serve { user_id, host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, paths, sessions, user_id.or_else(selected_user_from_env)).await
        }
        Command::Session { action } => manage_sessions(&config, &sessions, action).await,
        Command::Backup { action } => manage_backups(&paths, action),
    }
}

fn manage_backups(paths: &DataPaths, action: BackupAction) -> anyhow::Result<()> {
    match action {
        BackupAction::Create { out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(backup::default_backup_name()));
            let summary = backup::create_backup(paths.root(), &out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!(
                "✅ Backed up {} files ({} bytes) to {}",
                summary.files,
                summary.bytes,
                summary.path.display()
            );
        }
        BackupAction::Restore { path } => {
            let metadata = backup::validate_backup(&path).context("invalid backup")?;
            println!("📦 Backup created {} (version {})", metadata.created, metadata.version);
            let restored = backup::restore_backup(&path, paths.root())
                .with_context(|| format!("restoring {}", path.display()))?;
            println!("✅ Restored {} files into {}", restored, paths.root().display());
        }
    }
    Ok(())
}

async fn manage_sessions(config: &CopilotConfig, sessions: &SessionStore, action: SessionAction) -> anyhow::Result<()> {
    match action {
        SessionAction::Import { cookie, login_method } => {
            let validator = GameSessionValidator::new(&config.api);
            let user = validator
                .validate(cookie.trim())
                .await
                .context("the game did not accept this cookie")?;
            sessions.save_session(user.id, cookie.trim(), &user.company_name, &login_method)?;
            println!("✅ Saved session for {} (user {})", user.company_name, user.id);
        }
        SessionAction::List => {
            let saved = sessions.list_newest_first()?;
            if saved.is_empty() {
                println!("No saved sessions");
            }
            for (user_id, session) in saved {
                let saved_at = chrono::DateTime::from_timestamp(session.timestamp, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{:>10}  {:<30}  {:<8}  {}",
                    user_id, session.company_name, session.login_method, saved_at
                );
            }
        }
        SessionAction::Remove { user_id } => {
            if sessions.remove(user_id)? {
                println!("🗑️ Removed session for user {}", user_id);
            } else {
                println!("No saved session for user {}", user_id);
            }
        }
    }
    Ok(())
}

async fn serve(
    config: CopilotConfig,
    paths: DataPaths,
    sessions: SessionStore,
    selected_user: Option<u64>,
) -> anyhow::Result<()> {
    info!("🚢 Shipping Manager CoPilot starting");
    config.print_summary();

    let validator = GameSessionValidator::new(&config.api);
    let session = resolve_session(&sessions, &validator, selected_user).await?;
    let user = session.user;

    let mut client = GameClient::new(&session.cookie, &config.api)?;
    client.set_debug_mode(config.logging.debug_mode);
    let api: Arc<dyn GameApi> = Arc::new(client);

    let broadcaster = Broadcaster::new();
    let cache = Arc::new(LookupCache::new());
    let lookup_ttl = Duration::from_secs(config.caching.lookup_ttl_seconds);

    let settings = Arc::new(SettingsStore::load(&paths.autopilot_settings_file(user.id)));
    let history = Arc::new(HijackHistoryStore::new(&paths.hijack_history_dir(user.id)));
    let autopilot = Arc::new(Autopilot::new(
        PilotContext {
            api: api.clone(),
            broadcaster: broadcaster.clone(),
            history,
            negotiation: config.negotiation.clone(),
        },
        settings,
    ));

    let index = Arc::new(AllianceIndex::new(&paths.alliance_index_file()));
    match index.load_snapshot() {
        Ok(0) => {
            let index = index.clone();
            let api = api.clone();
            tokio::spawn(async move {
                if let Err(e) = index.refresh(api.as_ref()).await {
                    warn!("⚠️ Initial alliance index failed: {}", e);
                }
            });
        }
        Ok(_) => {}
        Err(e) => warn!("⚠️ Could not read alliance index snapshot: {}", e),
    }

    let alliance_id = match api.get_company().await {
        Ok(company) => company.alliance_id,
        Err(e) => {
            warn!("⚠️ Could not read company data: {}", e);
            None
        }
    };
    let watcher = Arc::new(ChatWatcher::new(
        api.clone(),
        broadcaster.clone(),
        cache.clone(),
        lookup_ttl,
        alliance_id,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = default_schedule(&config.schedule, autopilot.clone(), watcher.clone(), index.clone(), api.clone())?;
    let job_handles = scheduler.start(shutdown_rx.clone());

    let bind: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    let state = Arc::new(ApiState::new(api, autopilot, cache, index, config, user).with_watcher(watcher));
    let server = start_http_server(bind, state, shutdown_rx).await?;

    info!("🚢 Ready - press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    info!("🛑 Shutting down");
    let _ = shutdown_tx.send(true);
    for handle in job_handles {
        let _ = handle.await;
    }
    let _ = server.await;

    info!("👋 Goodbye");
    Ok(())
}
