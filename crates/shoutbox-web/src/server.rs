//! Main web server setup and startup.
//!
//! [`WebServer`] composes the Axum router, registers all routes, and
//! starts the HTTP listener.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use tower_http::cors::CorsLayer;

use shoutbox_store::{Database, StatusStore, UserStore};

use crate::WebConfig;
use crate::api;
use crate::state::AppState;

/// The shoutbox web server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server over an already-migrated database.
    pub fn new(config: WebConfig, db: Database) -> Self {
        let users = UserStore::new(db.clone());
        let statuses = StatusStore::new(db);
        let state = Arc::new(AppState { users, statuses });
        Self { config, state }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_addr, self.config.port)
    }

    /// Build the Axum router with all routes registered.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin("*".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(tower_http::cors::Any);

        Router::new()
            // User routes.
            .route("/api/user/register", post(api::register))
            .route("/api/user/login", post(api::login))
            .route("/api/user/checkLogin", get(api::check_login))
            .route("/api/user/search-users", get(api::search_users))
            .route("/api/user/updateDescription", put(api::update_description))
            .route("/api/user/{username}", get(api::get_profile))
            // Status routes.
            .route("/api/status", get(api::list_statuses))
            .route("/api/status", post(api::create_status))
            .route("/api/status/user/{username}", get(api::list_user_statuses))
            .route("/api/status/{id}", put(api::update_status))
            .route("/api/status/{id}", delete(api::delete_status))
            .layer(cors)
            .with_state(Arc::clone(&self.state))
    }

    /// Start the server and block until it is shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot be bound.
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.addr();
        let router = self.router();

        tracing::info!(addr = %addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
