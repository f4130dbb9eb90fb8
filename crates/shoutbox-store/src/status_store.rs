//! Status update persistence.
//!
//! Provides SQLite-backed storage for short status posts. Statuses are
//! listed newest-first everywhere; the creation timestamp is immutable
//! and is the sole sort key (ties broken by id — UUID v7 ids are
//! time-ordered, so the order is stable).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A single status post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    /// Unique identifier (UUID v7).
    pub id: String,
    /// Username of the author. References `users.username` best-effort —
    /// there is no foreign key, matching the loose coupling of the
    /// original document store.
    pub username: String,
    /// The post body. The only mutable field.
    pub content: String,
    /// Unix timestamp when the status was created. Immutable.
    pub created_at: i64,
}

// ═══════════════════════════════════════════════════════════════════════
//  StatusStore
// ═══════════════════════════════════════════════════════════════════════

/// CRUD operations on status posts.
#[derive(Clone)]
pub struct StatusStore {
    db: Database,
}

impl StatusStore {
    /// Create a new status store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a new status with a server-assigned id and timestamp.
    #[instrument(skip(self, content))]
    pub async fn create(&self, username: &str, content: &str) -> StoreResult<Status> {
        if content.is_empty() {
            return Err(StoreError::InvalidArgument(
                "content must not be empty".into(),
            ));
        }

        let id = Uuid::now_v7().to_string();
        let username = username.to_string();
        let content = content.to_string();
        let now = Utc::now().timestamp();

        let status = Status {
            id: id.clone(),
            username: username.clone(),
            content: content.clone(),
            created_at: now,
        };

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO statuses (id, username, content, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![id, username, content, now],
                )?;
                Ok(())
            })
            .await?;

        debug!(status_id = %status.id, username = %status.username, "status created");
        Ok(status)
    }

    /// Fetch a single status by ID, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> StoreResult<Option<Status>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, username, content, created_at \
                     FROM statuses WHERE id = ?1",
                    rusqlite::params![id],
                    row_to_status,
                );
                match result {
                    Ok(status) => Ok(Some(status)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// List every status, newest first.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> StoreResult<Vec<Status>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, content, created_at \
                     FROM statuses ORDER BY created_at DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map([], row_to_status)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// List one user's statuses, newest first.
    #[instrument(skip(self))]
    pub async fn list_by_user(&self, username: &str) -> StoreResult<Vec<Status>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, content, created_at \
                     FROM statuses WHERE username = ?1 \
                     ORDER BY created_at DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![username], row_to_status)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Replace a status's content, leaving author and timestamp unchanged.
    ///
    /// Returns the updated record, or [`StoreError::NotFound`] if `id`
    /// does not exist.
    #[instrument(skip(self, content))]
    pub async fn update(&self, id: &str, content: &str) -> StoreResult<Status> {
        if content.is_empty() {
            return Err(StoreError::InvalidArgument(
                "content must not be empty".into(),
            ));
        }

        let id = id.to_string();
        let content = content.to_string();

        self.db
            .execute(move |conn| {
                let updated = conn.execute(
                    "UPDATE statuses SET content = ?2 WHERE id = ?1",
                    rusqlite::params![id, content],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "status",
                        id,
                    });
                }

                conn.query_row(
                    "SELECT id, username, content, created_at \
                     FROM statuses WHERE id = ?1",
                    rusqlite::params![id],
                    row_to_status,
                )
                .map_err(StoreError::Sqlite)
            })
            .await
    }

    /// Delete a status permanently.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let owned = id.to_string();
        self.db
            .execute(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM statuses WHERE id = ?1",
                    rusqlite::params![owned],
                )?;
                if deleted == 0 {
                    return Err(StoreError::NotFound {
                        entity: "status",
                        id: owned,
                    });
                }
                Ok(())
            })
            .await?;

        debug!(status_id = %id, "status deleted");
        Ok(())
    }
}

/// Map a SELECTed row to a [`Status`].
fn row_to_status(row: &rusqlite::Row<'_>) -> Result<Status, rusqlite::Error> {
    Ok(Status {
        id: row.get(0)?,
        username: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
    })
}

// ── tests ────────────────────────────────────────────────────────────
