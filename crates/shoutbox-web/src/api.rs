//! REST API route handlers.
//!
//! Provides the user endpoints (register, login, session check, profile,
//! description update, search) and the status endpoints (create, list,
//! edit, delete).  Domain errors from the store are mapped to HTTP
//! statuses here; nothing is retried — a store failure surfaces directly
//! as a response.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shoutbox_store::{Status, StoreError, User};

use crate::session::{SessionUser, session_cookie};
use crate::state::AppState;

/// Map a store error to an HTTP status plus a JSON message body.
fn error_response(err: StoreError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::InvalidCredentials => StatusCode::BAD_REQUEST,
        StoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }

    (status, Json(json!({"message": err.to_string()})))
}

// ---------------------------------------------------------------------------
// POST /api/user/register
// ---------------------------------------------------------------------------

/// Request body for registration.
#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    /// Optional profile text, defaults to empty.
    pub description: Option<String>,
}

/// Register a new account and log it in immediately by setting the
/// session cookie on the response.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> impl IntoResponse {
    let description = body.description.unwrap_or_default();

    match state
        .users
        .create(&body.username, &body.password, &description)
        .await
    {
        Ok(user) => {
            tracing::info!(username = %user.username, "user registered");
            let jar = jar.add(session_cookie(&user.id));
            (
                StatusCode::CREATED,
                jar,
                Json(json!({"message": "Registration successful and logged in"})),
            )
                .into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// POST /api/user/login
// ---------------------------------------------------------------------------

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// Verify credentials and establish a session.
///
/// An unknown username yields 404 and a wrong password 400, matching
/// the behavior the frontend was written against.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> impl IntoResponse {
    match state.users.authenticate(&body.username, &body.password).await {
        Ok(user) => {
            tracing::info!(username = %user.username, "user logged in");
            let jar = jar.add(session_cookie(&user.id));
            (
                StatusCode::OK,
                jar,
                Json(json!({
                    "message": "Login successful",
                    "user": {"username": user.username},
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/user/checkLogin
// ---------------------------------------------------------------------------

/// Resolve the session cookie back to an account.
///
/// The [`SessionUser`] extractor already produces 401 (no cookie) and
/// 404 (stale cookie) rejections, so reaching the handler means the
/// session is valid.
pub async fn check_login(SessionUser(user): SessionUser) -> impl IntoResponse {
    Json(json!({
        "user": {
            "username": user.username,
            "description": user.description,
        }
    }))
}

// ---------------------------------------------------------------------------
// GET /api/user/search-users
// ---------------------------------------------------------------------------

/// Query string for the username search endpoint.
#[derive(Deserialize)]
pub struct SearchParams {
    /// Substring to match, case-insensitively. Missing or empty matches all.
    pub query: Option<String>,
}

/// One search hit — only the username is exposed.
#[derive(Serialize)]
pub struct SearchHit {
    pub username: String,
}

/// Case-insensitive substring search over usernames.
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.query.unwrap_or_default();

    match state.users.search(&query).await {
        Ok(usernames) => {
            let hits: Vec<SearchHit> = usernames
                .into_iter()
                .map(|username| SearchHit { username })
                .collect();
            (StatusCode::OK, Json(json!(hits))).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/user/{username}
// ---------------------------------------------------------------------------

/// Public profile fields plus the user's statuses, newest first.
#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(rename = "userDetails")]
    pub user_details: UserDetails,
    pub statuses: Vec<Status>,
}

/// Public profile fields — no password material exists in [`User`] at all.
#[derive(Serialize)]
pub struct UserDetails {
    pub username: String,
    #[serde(rename = "joinedDate")]
    pub joined_date: i64,
    pub description: String,
}

/// Fetch a user's public profile and their posts.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    let user = match state.users.get_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "User not found"})),
            )
                .into_response();
        }
        Err(e) => return error_response(e).into_response(),
    };

    match state.statuses.list_by_user(&username).await {
        Ok(statuses) => Json(ProfileResponse {
            user_details: UserDetails {
                username: user.username,
                joined_date: user.joined_at,
                description: user.description,
            },
            statuses,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// PUT /api/user/updateDescription
// ---------------------------------------------------------------------------

/// Request body for a description update.
#[derive(Deserialize)]
pub struct UpdateDescriptionBody {
    pub username: String,
    pub description: String,
}

/// Update the profile description.
///
/// Requires a session, and the session user must be the named user —
/// the original shipped without this check and flagged it as missing.
pub async fn update_description(
    State(state): State<Arc<AppState>>,
    SessionUser(session): SessionUser,
    Json(body): Json<UpdateDescriptionBody>,
) -> impl IntoResponse {
    if session.username != body.username {
        return forbidden("Cannot update another user's description").into_response();
    }

    match state
        .users
        .update_description(&body.username, &body.description)
        .await
    {
        Ok(user) => Json(json!({
            "message": "Description updated successfully",
            "user": user,
        }))
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// List every status, newest first.
pub async fn list_statuses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.statuses.list_all().await {
        Ok(statuses) => (StatusCode::OK, Json(json!(statuses))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /api/status/user/{username}
// ---------------------------------------------------------------------------

/// List one user's statuses, newest first.
pub async fn list_user_statuses(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    match state.statuses.list_by_user(&username).await {
        Ok(statuses) => (StatusCode::OK, Json(json!(statuses))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// POST /api/status
// ---------------------------------------------------------------------------

/// Request body for creating a status.
#[derive(Deserialize)]
pub struct CreateStatusBody {
    pub content: String,
}

/// Create a status owned by the session user.
///
/// The author is taken from the session, never from the request body, so
/// a caller cannot post as someone else.
pub async fn create_status(
    State(state): State<Arc<AppState>>,
    SessionUser(session): SessionUser,
    Json(body): Json<CreateStatusBody>,
) -> impl IntoResponse {
    match state.statuses.create(&session.username, &body.content).await {
        Ok(status) => (StatusCode::CREATED, Json(json!(status))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// PUT /api/status/{id}
// ---------------------------------------------------------------------------

/// Request body for editing a status.
#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub content: String,
}

/// Replace a status's content. Owner-only.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    SessionUser(session): SessionUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> impl IntoResponse {
    match require_owner(&state, &session, &id).await {
        Ok(()) => {}
        Err(resp) => return resp.into_response(),
    }

    match state.statuses.update(&id, &body.content).await {
        Ok(status) => (StatusCode::OK, Json(json!(status))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// DELETE /api/status/{id}
// ---------------------------------------------------------------------------

/// Delete a status. Owner-only.
pub async fn delete_status(
    State(state): State<Arc<AppState>>,
    SessionUser(session): SessionUser,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match require_owner(&state, &session, &id).await {
        Ok(()) => {}
        Err(resp) => return resp.into_response(),
    }

    match state.statuses.delete(&id).await {
        Ok(()) => (StatusCode::OK, Json(json!({"deleted": true}))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Ownership checks
// ---------------------------------------------------------------------------

/// Verify that the session user owns status `id`.
///
/// 404 when the status does not exist, 403 when it belongs to someone
/// else.
async fn require_owner(
    state: &AppState,
    session: &User,
    id: &str,
) -> Result<(), (StatusCode, Json<Value>)> {
    match state.statuses.get(id).await {
        Ok(Some(status)) if status.username == session.username => Ok(()),
        Ok(Some(status)) => {
            tracing::warn!(
                status_id = %id,
                owner = %status.username,
                requester = %session.username,
                "rejected mutation of another user's status"
            );
            Err(forbidden("Cannot modify another user's status"))
        }
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("status not found: {id}")})),
        )),
        Err(e) => Err(error_response(e)),
    }
}

fn forbidden(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::FORBIDDEN, Json(json!({"message": message})))
}
