//! Shared application state for the web server.
//!
//! [`AppState`] is wrapped in an `Arc` and shared across all request
//! handlers.  It holds the two record stores; each store carries its own
//! clone of the database handle.

use shoutbox_store::{StatusStore, UserStore};

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// User accounts, credentials, and username search.
    pub users: UserStore,

    /// Status posts.
    pub statuses: StatusStore,
}
