use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::keys::normalize_key;
use crate::models::{HwidConflict, IssueLicense, LicenseRecord};

/// POST /admin/licenses - Issue a new unredeemed license key.
pub async fn issue_license(
    State(state): State<AppState>,
    Json(body): Json<IssueLicense>,
) -> Result<Json<LicenseRecord>> {
    let conn = state.db.get()?;
    let license = queries::issue_license(&conn, &state.key_prefix, &body)?;

    tracing::info!(key = %license.key, plan = license.plan.as_str(), created_by = %license.created_by, "License issued");

    Ok(Json(license))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLicensesQuery {
    pub owner_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListLicensesResponse {
    pub licenses: Vec<LicenseRecord>,
}

/// GET /admin/licenses?ownerId= - Support view of an owner's license history.
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(query): Query<ListLicensesQuery>,
) -> Result<Json<ListLicensesResponse>> {
    let owner_id = query.owner_id.trim();
    if owner_id.is_empty() {
        return Err(AppError::BadRequest("ownerId is required".into()));
    }

    let conn = state.db.get()?;
    let licenses = queries::list_licenses_for_owner(&conn, owner_id)?;

    Ok(Json(ListLicensesResponse { licenses }))
}

/// GET /admin/licenses/{key}
pub async fn get_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseRecord>> {
    let conn = state.db.get()?;
    let license = queries::find_by_key(&conn, &normalize_key(&key))?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    Ok(Json(license))
}

/// POST /admin/licenses/{key}/revoke - Entitlement evaluates to free
/// regardless of plan or expiry from this point on.
pub async fn revoke_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseRecord>> {
    let conn = state.db.get()?;
    let license = queries::revoke_license(&conn, &normalize_key(&key))?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    tracing::info!(key = %license.key, "License revoked");

    Ok(Json(license))
}

/// POST /admin/licenses/{key}/reactivate - Explicit administrative
/// re-activation; never happens automatically.
pub async fn reactivate_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseRecord>> {
    let conn = state.db.get()?;
    let license = queries::reactivate_license(&conn, &normalize_key(&key))?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    tracing::info!(key = %license.key, "License reactivated");

    Ok(Json(license))
}

/// POST /admin/licenses/{key}/reset-hwid - Clears the binding so the next
/// desktop login binds fresh.
pub async fn reset_hwid(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseRecord>> {
    let conn = state.db.get()?;
    let license = queries::reset_hwid(&conn, &normalize_key(&key))?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    tracing::info!(key = %license.key, "HWID reset");

    Ok(Json(license))
}

#[derive(Debug, Serialize)]
pub struct HwidConflictsResponse {
    pub conflicts: Vec<HwidConflict>,
}

/// GET /admin/licenses/{key}/hwid-conflicts - Audit trail of mismatched
/// hardware ids observed at login.
pub async fn list_hwid_conflicts(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HwidConflictsResponse>> {
    let conn = state.db.get()?;
    let license = queries::find_by_key(&conn, &normalize_key(&key))?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    let conflicts = queries::list_hwid_conflicts(&conn, &license.id)?;

    Ok(Json(HwidConflictsResponse { conflicts }))
}
