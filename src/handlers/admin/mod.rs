mod licenses;

pub use licenses::*;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/licenses", post(issue_license).get(list_licenses))
        .route("/admin/licenses/{key}", get(get_license))
        .route("/admin/licenses/{key}/revoke", post(revoke_license))
        .route("/admin/licenses/{key}/reactivate", post(reactivate_license))
        .route("/admin/licenses/{key}/reset-hwid", post(reset_hwid))
        .route(
            "/admin/licenses/{key}/hwid-conflicts",
            get(list_hwid_conflicts),
        )
        .layer(from_fn_with_state(state, admin_auth))
}
