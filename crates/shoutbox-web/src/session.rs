//! Cookie-based session resolution.
//!
//! The session mechanism is deliberately the one the application was
//! built with: a plain `userId` cookie holding the user's record id,
//! with no signature, expiry, or server-side session table.  The value
//! is resolved against the user store on every authenticated request,
//! so a stale cookie (deleted or never-existing user) is rejected.
//!
//! [`SessionUser`] is an extractor — adding it to a handler's signature
//! makes the route require a valid session and gives the handler the
//! resolved account.

use std::sync::Arc;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use serde_json::{Value, json};

use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "userId";

/// The user resolved from the request's session cookie.
#[derive(Debug, Clone)]
pub struct SessionUser(pub shoutbox_store::User);

impl FromRequestParts<Arc<AppState>> for SessionUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Not logged in"})),
            ));
        };

        match state.users.get(cookie.value()).await {
            Ok(Some(user)) => Ok(SessionUser(user)),
            Ok(None) => Err((
                StatusCode::NOT_FOUND,
                Json(json!({"message": "User not found"})),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": e.to_string()})),
                ))
            }
        }
    }
}

/// Build the session cookie for a freshly registered or logged-in user.
///
/// No expiry and no flags beyond the path — the identifier lives until
/// the browser discards it.
pub fn session_cookie(user_id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, user_id.to_owned()))
        .path("/")
        .build()
}
