//! Web interface for shoutbox.
//!
//! This crate provides the HTTP server that exposes the shoutbox
//! functionality as a JSON REST API.  It includes:
//!
//! - User endpoints: register, login, session check, profile retrieval,
//!   description update, and username search.
//! - Status endpoints: create, list (global and per-user), edit, delete.
//! - A cookie-based session extractor shared by all authenticated routes.

pub mod api;
pub mod server;
pub mod session;
pub mod state;

pub use server::WebServer;
pub use session::SessionUser;
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 5000,
        }
    }
}
