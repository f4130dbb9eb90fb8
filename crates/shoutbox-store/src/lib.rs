//! # shoutbox-store
//!
//! Storage layer for shoutbox.
//!
//! Provides SQLite-backed persistence for the two record kinds in the
//! system — user accounts and status posts — plus password hashing and
//! versioned schema migrations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  UserStore    (accounts, credentials,    │
//! │                username search)          │
//! │  StatusStore  (posts, newest-first)      │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL, spawn_blocking) │
//! │  Migrations (versioned, transactional)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use shoutbox_store::{Database, StatusStore, UserStore};
//!
//! let db = Database::open_and_migrate("data/shoutbox.db").await?;
//! let users = UserStore::new(db.clone());
//! let statuses = StatusStore::new(db.clone());
//!
//! let alice = users.create("alice", "secret1", "").await?;
//! statuses.create(&alice.username, "hello world").await?;
//! ```

pub mod db;
pub mod error;
pub mod migration;
pub mod status_store;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use status_store::{Status, StatusStore};
pub use user_store::{User, UserStore};
