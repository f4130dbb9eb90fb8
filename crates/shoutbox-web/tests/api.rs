//! Integration tests for the shoutbox HTTP API.
//!
//! Each test boots the full router on an ephemeral port over a fresh
//! in-memory database and drives it with `reqwest`. The session cookie
//! is carried by hand so the tests can also assert on requests that
//! deliberately omit or corrupt it.

use reqwest::StatusCode;
use serde_json::{Value, json};

use shoutbox_store::Database;
use shoutbox_web::{WebConfig, WebServer};

/// Boot a server over `db` on an ephemeral port and return its base URL.
async fn serve(db: Database) -> String {
    let server = WebServer::new(WebConfig::default(), db);
    let router = server.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

/// Boot a server over a fresh in-memory database.
async fn spawn_server() -> String {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().await.unwrap();
    serve(db).await
}

/// Pull the `userId=...` pair out of a response's Set-Cookie header.
fn session_cookie(resp: &reqwest::Response) -> String {
    let header = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("response should set the session cookie")
        .to_str()
        .unwrap();
    let pair = header.split(';').next().unwrap().trim().to_owned();
    assert!(pair.starts_with("userId="), "unexpected cookie: {pair}");
    pair
}

/// Register a user and return the session cookie pair.
async fn register(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> String {
    let resp = client
        .post(format!("{base}/api/user/register"))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    session_cookie(&resp)
}

// ═══════════════════════════════════════════════════════════════════════
//  Registration and login
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn register_duplicate_then_login_status_codes() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    // register alice/secret1 → 201
    let resp = client
        .post(format!("{base}/api/user/register"))
        .json(&json!({"username": "alice", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    session_cookie(&resp);

    // register alice again → 409, first record unaffected
    let resp = client
        .post(format!("{base}/api/user/register"))
        .json(&json!({"username": "alice", "password": "other12"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // login alice/wrong → 400
    let resp = client
        .post(format!("{base}/api/user/login"))
        .json(&json!({"username": "alice", "password": "wrong"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // login alice/secret1 → 200
    let resp = client
        .post(format!("{base}/api/user/login"))
        .json(&json!({"username": "alice", "password": "secret1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn login_unknown_user_is_404() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/user/login"))
        .json(&json!({"username": "nobody", "password": "whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════
//  Session check
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn check_login_resolves_the_cookie() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    // No cookie → 401.
    let resp = client
        .get(format!("{base}/api/user/checkLogin"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Valid cookie → 200 with profile fields.
    let cookie = register(&client, &base, "alice", "secret1").await;
    let resp = client
        .get(format!("{base}/api/user/checkLogin"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["description"], "");

    // Cookie pointing at a nonexistent record → 404.
    let resp = client
        .get(format!("{base}/api/user/checkLogin"))
        .header(reqwest::header::COOKIE, "userId=not-a-real-id")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════
//  Status lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn status_create_update_delete_lifecycle() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let cookie = register(&client, &base, "alice", "secret1").await;

    // Create → 201, appears first in the global listing.
    let resp = client
        .post(format!("{base}/api/status"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"content": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_owned();
    assert_eq!(created["username"], "alice");
    let created_at = created["created_at"].as_i64().unwrap();

    // A second post lands above it.
    let resp = client
        .post(format!("{base}/api/status"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"content": "newer post"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let all: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = all.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["content"], "newer post");
    assert_eq!(list[1]["content"], "hi");

    // Edit: content changes, position and timestamp do not.
    let resp = client
        .put(format!("{base}/api/status/{id}"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"content": "hi there"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let all: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = all.as_array().unwrap();
    assert_eq!(list[1]["content"], "hi there");
    assert_eq!(list[1]["username"], "alice");
    assert_eq!(list[1]["created_at"].as_i64().unwrap(), created_at);

    // Delete → gone from the listing, further mutation is 404.
    let resp = client
        .delete(format!("{base}/api/status/{id}"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let all: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);

    let resp = client
        .delete(format!("{base}/api/status/{id}"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_mutation_requires_a_session() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/status"))
        .json(&json!({"content": "anonymous"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_mutation_is_owner_only() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let alice = register(&client, &base, "alice", "secret1").await;
    let bob = register(&client, &base, "bob", "secret2").await;

    let created: Value = client
        .post(format!("{base}/api/status"))
        .header(reqwest::header::COOKIE, &alice)
        .json(&json!({"content": "mine"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    // Bob cannot edit or delete Alice's post.
    let resp = client
        .put(format!("{base}/api/status/{id}"))
        .header(reqwest::header::COOKIE, &bob)
        .json(&json!({"content": "hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .delete(format!("{base}/api/status/{id}"))
        .header(reqwest::header::COOKIE, &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The post is untouched.
    let all: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap()[0]["content"], "mine");
}

// ═══════════════════════════════════════════════════════════════════════
//  Profiles
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn profile_returns_details_and_statuses_newest_first() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let cookie = register(&client, &base, "alice", "secret1").await;

    for content in ["one", "two"] {
        let resp = client
            .post(format!("{base}/api/status"))
            .header(reqwest::header::COOKIE, &cookie)
            .json(&json!({"content": content}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = client
        .get(format!("{base}/api/user/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["userDetails"]["username"], "alice");
    assert!(body["userDetails"]["joinedDate"].as_i64().unwrap() > 0);
    let statuses = body["statuses"].as_array().unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0]["content"], "two");
    assert_eq!(statuses[1]["content"], "one");

    // Unknown user → 404.
    let resp = client
        .get(format!("{base}/api/user/nobody"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn per_user_status_listing_is_filtered() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let alice = register(&client, &base, "alice", "secret1").await;
    let bob = register(&client, &base, "bob", "secret2").await;

    for (cookie, content) in [(&alice, "from alice"), (&bob, "from bob")] {
        client
            .post(format!("{base}/api/status"))
            .header(reqwest::header::COOKIE, cookie.clone())
            .json(&json!({"content": content}))
            .send()
            .await
            .unwrap();
    }

    let body: Value = client
        .get(format!("{base}/api/status/user/alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["content"], "from alice");
}

// ═══════════════════════════════════════════════════════════════════════
//  Description updates
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn update_description_for_own_account() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let cookie = register(&client, &base, "alice", "secret1").await;

    let resp = client
        .put(format!("{base}/api/user/updateDescription"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"username": "alice", "description": "rustacean"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["description"], "rustacean");

    // The change is visible on the public profile.
    let profile: Value = client
        .get(format!("{base}/api/user/alice"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(profile["userDetails"]["description"], "rustacean");
}

#[tokio::test]
async fn update_description_for_another_user_is_forbidden() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    register(&client, &base, "alice", "secret1").await;
    let bob = register(&client, &base, "bob", "secret2").await;

    let resp = client
        .put(format!("{base}/api/user/updateDescription"))
        .header(reqwest::header::COOKIE, &bob)
        .json(&json!({"username": "alice", "description": "defaced"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ═══════════════════════════════════════════════════════════════════════
//  Search
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn search_users_is_case_insensitive() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    register(&client, &base, "Ann2", "secret1").await;
    register(&client, &base, "bob", "secret2").await;

    let body: Value = client
        .get(format!("{base}/api/user/search-users?query=ann"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["username"], "Ann2");

    // Missing query matches everyone.
    let body: Value = client
        .get(format!("{base}/api/user/search-users"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

// ═══════════════════════════════════════════════════════════════════════
//  Disk-backed database
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn data_survives_a_server_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shoutbox.db");
    let client = reqwest::Client::new();

    // First server instance: register and post.
    let db = Database::open_and_migrate(path.clone()).await.unwrap();
    let base = serve(db).await;
    let cookie = register(&client, &base, "alice", "secret1").await;
    let resp = client
        .post(format!("{base}/api/status"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"content": "durable"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Second instance over the same file: account and post are still there.
    let db = Database::open_and_migrate(path).await.unwrap();
    let base = serve(db).await;

    let resp = client
        .get(format!("{base}/api/user/checkLogin"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let all: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = all.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["content"], "durable");
}

#[tokio::test]
async fn search_query_length_is_rejected_over_the_cap() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let oversized = "a".repeat(80);
    let resp = client
        .get(format!("{base}/api/user/search-users?query={oversized}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
