// Shipping Manager CoPilot - companion backend library
// Game API proxy, session handling, live UI updates and autopilot routines

pub mod models;
pub mod client;
pub mod session;
pub mod storage;
pub mod config;
pub mod logging;
pub mod error;
pub mod broadcast;
pub mod negotiation;
pub mod pilots;
pub mod autopilot;
pub mod scheduler;
pub mod chat_watch;
pub mod indexer;
pub mod views;
pub mod backup;
pub mod api;

// Re-export commonly used types
pub use models::{
    vessel::Vessel,
    hijacking::HijackCase,
    company::{Company, User},
};

pub use client::{GameApi, GameClient};
pub use autopilot::Autopilot;
pub use broadcast::{Broadcaster, BroadcastEvent};
pub use config::CopilotConfig;
pub use error::{CopilotError, Result};

// Constants
pub const API_BASE_URL: &str = "https://shippingmanager.cc/api";
pub const SESSION_COOKIE_NAME: &str = "shipping_manager_session";
pub const KEYRING_SERVICE_NAME: &str = "ShippingManagerCoPilot";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
