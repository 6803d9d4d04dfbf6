use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::entitlement::{evaluate, Entitlement};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::hwid::{self, HwidDecision};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub owner_id: String,
    /// Hardware id reported by a desktop client; absent for web logins.
    #[serde(default)]
    pub hwid: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub entitlement: Entitlement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hwid: Option<HwidDecision>,
}

/// POST /login - Called after every successful identity-provider login.
///
/// Computes the displayed entitlement and, when a desktop client reported a
/// hardware id, runs the binding policy. A conflicting hwid never blocks the
/// login and never overwrites the bound value; it is recorded for audit.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>> {
    let owner_id = body.owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::BadRequest("ownerId is required".into()));
    }

    let conn = state.db.get()?;
    let license = queries::find_active_license_for_owner(&conn, owner_id)?;

    let mut hwid_decision = None;
    if let (Some(license), Some(reported)) = (license.as_ref(), body.hwid.as_deref()) {
        let reported = reported.trim();
        if reported.is_empty() {
            return Err(AppError::BadRequest("hwid must not be empty".into()));
        }

        let mut bound = license.hwid.clone();
        let mut decision = hwid::decide(bound.as_deref(), reported);
        if decision == HwidDecision::Bind && !queries::bind_hwid(&conn, &license.id, reported)? {
            // Another login bound a hwid first; re-read and re-run the policy.
            let current = queries::find_by_key(&conn, &license.key)?
                .ok_or_else(|| AppError::Internal("License disappeared during binding".into()))?;
            bound = current.hwid;
            decision = hwid::decide(bound.as_deref(), reported);
        }

        if decision == HwidDecision::Conflict {
            let bound = bound.as_deref().unwrap_or_default();
            queries::record_hwid_conflict(&conn, &license.id, bound, reported)?;
            tracing::warn!(
                license_id = %license.id,
                "HWID conflict observed; possible account sharing, login allowed"
            );
        }

        hwid_decision = Some(decision);
    }

    let entitlement = evaluate(license.as_ref(), Utc::now().timestamp());

    Ok(Json(LoginResponse {
        entitlement,
        hwid: hwid_decision,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementQuery {
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub entitlement: Entitlement,
}

/// GET /entitlement - Dashboard read path for the current plan/status.
pub async fn get_entitlement(
    State(state): State<AppState>,
    Query(query): Query<EntitlementQuery>,
) -> Result<Json<EntitlementResponse>> {
    let owner_id = query.owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::BadRequest("ownerId is required".into()));
    }

    let conn = state.db.get()?;
    let entitlement = queries::entitlement_for_owner(&conn, owner_id, Utc::now().timestamp())?;

    Ok(Json(EntitlementResponse { entitlement }))
}
