//! HTTP API for the web UI: game proxy routes, autopilot control and the
//! WebSocket event stream.

mod alliance;
mod coop;
mod error;
mod harbor;
mod hijacking;
mod messenger;
mod server;
mod staff;
mod state;
mod system;
mod ws;

pub use error::ApiError;
pub use server::{build_router, start_http_server};
pub use state::ApiState;
