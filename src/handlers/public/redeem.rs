use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::entitlement::{evaluate, Entitlement};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::keys::{is_valid_key, normalize_key};
use crate::models::RedeemOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemBody {
    pub key: String,
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub key: String,
    pub entitlement: Entitlement,
}

/// POST /redeem - Claim an unredeemed license key for an account.
///
/// Redemption is strictly single-use and first-writer-wins; the store-level
/// conditional write guarantees at most one winner under concurrency.
pub async fn redeem_license(
    State(state): State<AppState>,
    Json(body): Json<RedeemBody>,
) -> Result<Json<RedeemResponse>> {
    if body.owner_id.trim().is_empty() {
        return Err(AppError::BadRequest("ownerId is required".into()));
    }

    let key = normalize_key(&body.key);
    if !is_valid_key(&key) {
        return Err(AppError::BadRequest("Invalid license key format".into()));
    }

    let conn = state.db.get()?;

    match queries::redeem_license(&conn, &key, body.owner_id.trim())? {
        RedeemOutcome::Redeemed(license) => {
            tracing::info!(key = %license.key, owner_id = %body.owner_id, "License redeemed");
            let entitlement = evaluate(Some(&license), Utc::now().timestamp());
            Ok(Json(RedeemResponse {
                key: license.key,
                entitlement,
            }))
        }
        RedeemOutcome::NotFound => Err(AppError::NotFound("Invalid license key".into())),
        RedeemOutcome::Revoked => Err(AppError::Forbidden(
            "This license key has been revoked".into(),
        )),
        RedeemOutcome::AlreadyRedeemed => Err(AppError::Conflict(
            "This license key has already been used".into(),
        )),
    }
}
