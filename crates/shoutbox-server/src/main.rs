//! Server entry point for shoutbox.
//!
//! This binary provides the `shoutbox` command: it loads configuration
//! from CLI flags and the environment, opens and migrates the database,
//! and starts the HTTP server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shoutbox_store::Database;
use shoutbox_web::{WebConfig, WebServer};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// shoutbox — a minimal social-status web service.
#[derive(Parser)]
#[command(name = "shoutbox", version, about = "shoutbox — status update server")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "SHOUTBOX_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on.
    #[arg(long, env = "SHOUTBOX_PORT", default_value_t = 5000)]
    port: u16,

    /// Path to the SQLite database file.
    #[arg(long, env = "SHOUTBOX_DB", default_value = "data/shoutbox.db")]
    db: PathBuf,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // .env values become visible to clap's `env = ...` fallbacks, so load
    // it before parsing.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_tracing("info");

    info!("starting shoutbox");

    // 1. Make sure the data directory exists.
    if let Some(parent) = cli.db.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    // 2. Open the store and run migrations.
    let db = Database::open_and_migrate(cli.db.clone())
        .await
        .context("failed to open database")?;
    info!(path = %cli.db.display(), "database ready");

    // 3. Start the HTTP server.
    let config = WebConfig {
        bind_addr: cli.bind,
        port: cli.port,
    };
    let server = WebServer::new(config, db);

    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
