//! Tests for POST /roles/sync, driven against a stub Discord API server so
//! the membership short-circuit, the revoke-before-grant call order, and
//! upstream failure handling are all observable.

use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;

use dashy_licensing::discord::{DiscordClient, DiscordConfig};

mod common;
use common::*;

/// Records every request it sees and answers like the Discord REST API:
/// member lookups are GET (200 or 404), role changes are PUT/DELETE (204).
#[derive(Clone)]
struct StubDiscord {
    requests: Arc<Mutex<Vec<String>>>,
    member_exists: bool,
    fail_role_calls: bool,
}

impl StubDiscord {
    fn new(member_exists: bool) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            member_exists,
            fail_role_calls: false,
        }
    }

    fn recorded(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn stub_handler(State(stub): State<StubDiscord>, req: Request) -> StatusCode {
    stub.requests
        .lock()
        .unwrap()
        .push(format!("{} {}", req.method(), req.uri().path()));

    if req.method() == Method::GET {
        if stub.member_exists {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    } else if stub.fail_role_calls {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn spawn_stub(stub: StubDiscord) -> String {
    let app = Router::new().fallback(stub_handler).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn state_with_discord(base_url: &str) -> AppState {
    let client = DiscordClient::new(DiscordConfig {
        bot_token: "test-bot-token".to_string(),
        guild_id: "guild-1".to_string(),
        monthly_role_id: "role-monthly".to_string(),
        lifetime_role_id: "role-lifetime".to_string(),
    })
    .unwrap()
    .with_base_url(base_url);

    let mut state = create_test_state();
    state.discord = Some(Arc::new(client));
    state
}

fn redeem_for_user(state: &AppState, plan: LicensePlan, expires_at: Option<i64>) {
    let conn = state.db.get().unwrap();
    let license = issue_test_license(&conn, plan, expires_at);
    queries::redeem_license(&conn, &license.key, "user-1").unwrap();
}

fn sync_body() -> serde_json::Value {
    json!({"ownerId": "user-1", "discordUserId": "1234"})
}

#[tokio::test]
async fn sync_without_discord_configured_is_unavailable() {
    let state = create_test_state();
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Unavailable");
}

#[tokio::test]
async fn sync_requires_both_identifiers() {
    let state = create_test_state();
    let app = app(state);

    for body in [
        json!({"ownerId": "", "discordUserId": "1234"}),
        json!({"ownerId": "user-1", "discordUserId": " "}),
    ] {
        let (status, _) = send_json(&app, "POST", "/roles/sync", Some(body), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn non_member_short_circuits_before_any_role_change() {
    let stub = StubDiscord::new(false);
    let base_url = spawn_stub(stub.clone()).await;
    let state = state_with_discord(&base_url);
    redeem_for_user(&state, LicensePlan::Lifetime, None);
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_a_member");
    assert!(body["message"].as_str().unwrap().contains("Join"));

    // Only the membership lookup went out.
    assert_eq!(
        stub.recorded(),
        vec!["GET /guilds/guild-1/members/1234".to_string()]
    );
}

#[tokio::test]
async fn lifetime_member_is_granted_after_the_monthly_revoke() {
    let stub = StubDiscord::new(true);
    let base_url = spawn_stub(stub.clone()).await;
    let state = state_with_discord(&base_url);
    redeem_for_user(&state, LicensePlan::Lifetime, None);
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "synced");
    assert_eq!(body["role"], "lifetime");

    // Revoke runs before the grant.
    assert_eq!(
        stub.recorded(),
        vec![
            "GET /guilds/guild-1/members/1234".to_string(),
            "DELETE /guilds/guild-1/members/1234/roles/role-monthly".to_string(),
            "PUT /guilds/guild-1/members/1234/roles/role-lifetime".to_string(),
        ]
    );
}

#[tokio::test]
async fn monthly_member_is_granted_after_the_lifetime_revoke() {
    let stub = StubDiscord::new(true);
    let base_url = spawn_stub(stub.clone()).await;
    let state = state_with_discord(&base_url);
    redeem_for_user(&state, LicensePlan::Monthly, Some(future_timestamp(30)));
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "synced");
    assert_eq!(body["role"], "monthly");

    assert_eq!(
        stub.recorded(),
        vec![
            "GET /guilds/guild-1/members/1234".to_string(),
            "DELETE /guilds/guild-1/members/1234/roles/role-lifetime".to_string(),
            "PUT /guilds/guild-1/members/1234/roles/role-monthly".to_string(),
        ]
    );
}

#[tokio::test]
async fn free_member_has_both_roles_revoked() {
    let stub = StubDiscord::new(true);
    let base_url = spawn_stub(stub.clone()).await;
    let state = state_with_discord(&base_url);
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_entitled");
    assert!(body.get("role").is_none() || body["role"].is_null());

    assert_eq!(
        stub.recorded(),
        vec![
            "GET /guilds/guild-1/members/1234".to_string(),
            "DELETE /guilds/guild-1/members/1234/roles/role-monthly".to_string(),
            "DELETE /guilds/guild-1/members/1234/roles/role-lifetime".to_string(),
        ]
    );
}

#[tokio::test]
async fn role_api_failure_surfaces_as_a_retryable_upstream_error() {
    let mut stub = StubDiscord::new(true);
    stub.fail_role_calls = true;
    let base_url = spawn_stub(stub.clone()).await;
    let state = state_with_discord(&base_url);
    redeem_for_user(&state, LicensePlan::Lifetime, None);
    let app = app(state);

    let (status, body) = send_json(&app, "POST", "/roles/sync", Some(sync_body()), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Upstream error");
}
