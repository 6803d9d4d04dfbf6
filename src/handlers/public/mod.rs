mod login;
mod redeem;
mod roles;

pub use login::*;
pub use redeem::*;
pub use roles::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // POST /redeem claims an unredeemed license key for an account
        .route("/redeem", post(redeem_license))
        // POST /login is the desktop/portal login bridge (entitlement + optional hwid binding)
        .route("/login", post(login))
        // GET /entitlement is the dashboard read path
        .route("/entitlement", get(get_entitlement))
        .route("/roles/sync", post(sync_roles))
}
