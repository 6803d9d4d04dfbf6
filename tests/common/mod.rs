//! Test utilities and fixtures for dashy-licensing integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use dashy_licensing::db::{init_db, queries, AppState, DbPool};
pub use dashy_licensing::handlers;
pub use dashy_licensing::models::*;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState for testing with an in-memory database.
///
/// Pool size 1 so every checkout sees the same in-memory database.
pub fn create_test_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        admin_token: TEST_ADMIN_TOKEN.to_string(),
        key_prefix: "DASHY".to_string(),
        discord: None,
    }
}

/// Create a Router with the public and admin surfaces wired up
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::public::router())
        .merge(handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Issue a test license directly through the query layer
pub fn issue_test_license(
    conn: &Connection,
    plan: LicensePlan,
    expires_at: Option<i64>,
) -> LicenseRecord {
    let input = IssueLicense {
        plan,
        expires_at,
        created_by: "test-suite".to_string(),
    };
    queries::issue_license(conn, "DASHY", &input).expect("Failed to issue test license")
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Get a future timestamp (days from now)
pub fn future_timestamp(days: i64) -> i64 {
    now() + (days * 86400)
}

/// Get a past timestamp (days ago)
pub fn past_timestamp(days: i64) -> i64 {
    now() - (days * 86400)
}

/// Send a JSON request through the router and return (status, parsed body)
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response should be valid JSON")
    };

    (status, json)
}

/// Shorthand for admin-authenticated requests
pub async fn send_admin(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_json(app, method, uri, body, Some(TEST_ADMIN_TOKEN)).await
}
