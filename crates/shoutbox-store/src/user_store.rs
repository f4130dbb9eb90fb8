//! User account persistence for shoutbox.
//!
//! Provides SQLite-backed storage for user accounts with password
//! hashing via PBKDF2-HMAC-SHA256 (ring). Passwords are stored as
//! `base64(salt):base64(hash)` strings and never leave this module:
//! the public [`User`] type has no password field.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A user account, as exposed to the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID v7). Also serves as the session cookie value.
    pub id: String,
    /// Unique login name, case-sensitive.
    pub username: String,
    /// Free-form profile text, empty by default.
    pub description: String,
    /// Unix timestamp when the account was created.
    pub joined_at: i64,
}

// ═══════════════════════════════════════════════════════════════════════
//  Password hashing
// ═══════════════════════════════════════════════════════════════════════

/// PBKDF2-HMAC-SHA256 iteration count. Fixed cost, like the classic
/// bcrypt work factor — raising it invalidates no stored hashes because
/// verification re-derives with the same parameters.
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// Derived key length in bytes.
const KEY_LEN: usize = 32;

/// PBKDF2 algorithm.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Hash a password and return a storable string of the form `base64(salt):base64(hash)`.
fn hash_password(password: &str) -> StoreResult<String> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| StoreError::InvalidArgument("failed to generate random salt".into()))?;

    let mut hash = [0u8; KEY_LEN];
    let iterations =
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero");
    pbkdf2::derive(
        PBKDF2_ALG,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    let encoded = format!("{}:{}", BASE64.encode(salt), BASE64.encode(hash));
    Ok(encoded)
}

/// Verify a password against a stored hash string (`base64(salt):base64(hash)`).
fn verify_password(password: &str, stored: &str) -> StoreResult<bool> {
    let parts: Vec<&str> = stored.splitn(2, ':').collect();
    if parts.len() != 2 {
        return Err(StoreError::InvalidArgument(
            "malformed password hash".into(),
        ));
    }

    let salt = BASE64
        .decode(parts[0])
        .map_err(|e| StoreError::InvalidArgument(format!("invalid salt encoding: {e}")))?;
    let expected_hash = BASE64
        .decode(parts[1])
        .map_err(|e| StoreError::InvalidArgument(format!("invalid hash encoding: {e}")))?;

    let iterations =
        std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero");

    Ok(pbkdf2::verify(
        PBKDF2_ALG,
        iterations,
        &salt,
        password.as_bytes(),
        &expected_hash,
    )
    .is_ok())
}

// ═══════════════════════════════════════════════════════════════════════
//  UserStore
// ═══════════════════════════════════════════════════════════════════════

/// Maximum accepted length for a search query, in characters.
///
/// The search input comes straight from the URL; bounding it keeps a
/// hostile client from shipping arbitrarily large patterns to SQLite.
const MAX_SEARCH_QUERY_LEN: usize = 64;

/// CRUD operations on user accounts, credential verification, and
/// username search.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create a new user store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new user account.
    ///
    /// The password is hashed with PBKDF2-HMAC-SHA256 before storage.
    /// Returns [`StoreError::Conflict`] if the username is already taken.
    #[instrument(skip(self, password))]
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        description: &str,
    ) -> StoreResult<User> {
        if username.is_empty() {
            return Err(StoreError::InvalidArgument(
                "username must not be empty".into(),
            ));
        }
        if password.is_empty() {
            return Err(StoreError::InvalidArgument(
                "password must not be empty".into(),
            ));
        }

        let id = Uuid::now_v7().to_string();
        let username = username.to_string();
        let description = description.to_string();
        let now = Utc::now().timestamp();

        let password_hash = hash_password(password)?;

        let user = User {
            id: id.clone(),
            username: username.clone(),
            description: description.clone(),
            joined_at: now,
        };

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, password_hash, description, joined_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![id, username, password_hash, description, now],
                )
                .map_err(|e| {
                    if let rusqlite::Error::SqliteFailure(ref err, _) = e
                        && err.code == rusqlite::ErrorCode::ConstraintViolation
                    {
                        return StoreError::Conflict(format!(
                            "username already taken: {username}"
                        ));
                    }
                    StoreError::Sqlite(e)
                })?;
                Ok(())
            })
            .await?;

        debug!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Fetch a single user by ID, returning `None` if not found.
    ///
    /// This is how a session cookie is resolved back to an account.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> StoreResult<Option<User>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, username, description, joined_at \
                     FROM users WHERE id = ?1",
                    rusqlite::params![id],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            description: row.get(2)?,
                            joined_at: row.get(3)?,
                        })
                    },
                );
                match result {
                    Ok(user) => Ok(Some(user)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Fetch a single user by username, returning `None` if not found.
    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, username, description, joined_at \
                     FROM users WHERE username = ?1",
                    rusqlite::params![username],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            description: row.get(2)?,
                            joined_at: row.get(3)?,
                        })
                    },
                );
                match result {
                    Ok(user) => Ok(Some(user)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Verify a username/password pair.
    ///
    /// Returns [`StoreError::NotFound`] when the username does not exist
    /// and [`StoreError::InvalidCredentials`] when the password does not
    /// match — the HTTP layer maps these to distinct status codes.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> StoreResult<User> {
        let username = username.to_string();
        let password = password.to_string();

        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT id, username, password_hash, description, joined_at \
                     FROM users WHERE username = ?1",
                    rusqlite::params![username],
                    |row| {
                        Ok(AuthRow {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            password_hash: row.get(2)?,
                            description: row.get(3)?,
                            joined_at: row.get(4)?,
                        })
                    },
                );

                match result {
                    Ok(row) => {
                        let valid = verify_password(&password, &row.password_hash)?;
                        if valid {
                            Ok(User {
                                id: row.id,
                                username: row.username,
                                description: row.description,
                                joined_at: row.joined_at,
                            })
                        } else {
                            Err(StoreError::InvalidCredentials)
                        }
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Err(StoreError::NotFound {
                        entity: "user",
                        id: username,
                    }),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Update a user's profile description, returning the updated record.
    #[instrument(skip(self))]
    pub async fn update_description(
        &self,
        username: &str,
        description: &str,
    ) -> StoreResult<User> {
        let username = username.to_string();
        let description = description.to_string();

        self.db
            .execute(move |conn| {
                let updated = conn.execute(
                    "UPDATE users SET description = ?2 WHERE username = ?1",
                    rusqlite::params![username, description],
                )?;
                if updated == 0 {
                    return Err(StoreError::NotFound {
                        entity: "user",
                        id: username,
                    });
                }

                conn.query_row(
                    "SELECT id, username, description, joined_at \
                     FROM users WHERE username = ?1",
                    rusqlite::params![username],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            description: row.get(2)?,
                            joined_at: row.get(3)?,
                        })
                    },
                )
                .map_err(StoreError::Sqlite)
            })
            .await
    }

    /// Case-insensitive substring search over usernames.
    ///
    /// An empty query matches every user. The match is a literal
    /// substring — the query is escaped before being spliced into the
    /// `LIKE` pattern, so `%` and `_` in user input match themselves.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> StoreResult<Vec<String>> {
        if query.chars().count() > MAX_SEARCH_QUERY_LEN {
            return Err(StoreError::InvalidArgument(format!(
                "search query longer than {MAX_SEARCH_QUERY_LEN} characters"
            )));
        }

        let pattern = format!("%{}%", escape_like(query));

        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT username FROM users \
                     WHERE lower(username) LIKE lower(?1) ESCAPE '\\' \
                     ORDER BY username ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![pattern], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(rows)
            })
            .await
    }

    /// Return the total number of users.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<i64> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                Ok(count)
            })
            .await
    }
}

/// Escape `LIKE` metacharacters in user input so it matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw row data for authentication (includes password_hash).
struct AuthRow {
    id: String,
    username: String,
    password_hash: String,
    description: String,
    joined_at: i64,
}

// ── tests ────────────────────────────────────────────────────────────
