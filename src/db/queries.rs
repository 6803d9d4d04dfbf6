use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::entitlement::{evaluate, Entitlement};
use crate::error::{AppError, Result};
use crate::keys::{generate_license_key, KEY_GENERATION_ATTEMPTS};
use crate::models::{HwidConflict, IssueLicense, LicensePlan, LicenseRecord, RedeemOutcome};

use super::from_row::{query_all, query_one, FromRow, HWID_CONFLICT_COLS, LICENSE_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(column)
    )
}

// ============ Issuance ============

/// Issue a new unredeemed license key.
///
/// The key is generated server-side and collision-checked against the store
/// via the UNIQUE constraint, with a bounded retry before failing the
/// issuance request. A monthly plan must carry an expiry; rejecting the
/// missing case here keeps the "null expiry on a non-lifetime plan" anomaly
/// out of freshly issued rows.
pub fn issue_license(
    conn: &Connection,
    key_prefix: &str,
    input: &IssueLicense,
) -> Result<LicenseRecord> {
    if input.created_by.trim().is_empty() {
        return Err(AppError::BadRequest("createdBy is required".into()));
    }
    match input.plan {
        LicensePlan::Lifetime => {
            if input.expires_at.is_some() {
                return Err(AppError::BadRequest(
                    "expiresAt is not allowed on a lifetime plan".into(),
                ));
            }
        }
        LicensePlan::Monthly => {
            if input.expires_at.is_none() {
                return Err(AppError::BadRequest(
                    "expiresAt is required on a monthly plan".into(),
                ));
            }
        }
    }

    for _ in 0..KEY_GENERATION_ATTEMPTS {
        let id = gen_id();
        let key = generate_license_key(key_prefix);
        let created_at = now();

        let inserted = conn.execute(
            "INSERT INTO licenses (id, key, plan, owner_id, hwid, is_active, expires_at, redeemed_at, created_by, created_at)
             VALUES (?1, ?2, ?3, NULL, NULL, 1, ?4, NULL, ?5, ?6)",
            params![&id, &key, input.plan.as_str(), input.expires_at, &input.created_by, created_at],
        );

        match inserted {
            Ok(_) => {
                return Ok(LicenseRecord {
                    id,
                    key,
                    plan: input.plan,
                    owner_id: None,
                    hwid: None,
                    is_active: true,
                    expires_at: input.expires_at,
                    redeemed_at: None,
                    created_by: input.created_by.clone(),
                    created_at,
                })
            }
            Err(e) if is_unique_violation(&e, "licenses.key") => {
                tracing::debug!("License key collision, regenerating");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "Failed to generate a unique license key after {} attempts",
        KEY_GENERATION_ATTEMPTS
    )))
}

// ============ Lookups ============

/// Look up a license by its canonical (normalized) key.
pub fn find_by_key(conn: &Connection, key: &str) -> Result<Option<LicenseRecord>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE key = ?1", LICENSE_COLS),
        &[&key],
    )
}

/// The canonical active license row for an owner.
///
/// At most one active row should exist per owner; if multiple do (possible
/// transiently through revoke/re-issue sequences), the most recently created
/// wins and the anomaly is flagged for observability. Data-integrity
/// anomalies on the returned row are flagged here so every caller gets the
/// warning and the evaluator stays pure.
pub fn find_active_license_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Option<LicenseRecord>> {
    let active: i64 = conn.query_row(
        "SELECT COUNT(*) FROM licenses WHERE owner_id = ?1 AND is_active = 1",
        params![owner_id],
        |row| row.get(0),
    )?;
    if active > 1 {
        tracing::warn!(
            owner_id,
            active,
            "Owner has multiple active licenses; using most recently created"
        );
    }

    let license: Option<LicenseRecord> = query_one(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE owner_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, id DESC LIMIT 1",
            LICENSE_COLS
        ),
        &[&owner_id],
    )?;

    if let Some(ref license) = license {
        if license.plan == LicensePlan::Monthly && license.expires_at.is_none() {
            tracing::warn!(
                license_id = %license.id,
                "Monthly license has no expiry recorded; evaluating as not entitled"
            );
        }
    }

    Ok(license)
}

/// All licenses ever associated with an owner, newest first (support view).
pub fn list_licenses_for_owner(conn: &Connection, owner_id: &str) -> Result<Vec<LicenseRecord>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE owner_id = ?1 ORDER BY created_at DESC",
            LICENSE_COLS
        ),
        &[&owner_id],
    )
}

/// Fetch and evaluate the current entitlement for an owner.
///
/// This is the shared read path for every surface; callers never duplicate
/// the expiry math.
pub fn entitlement_for_owner(conn: &Connection, owner_id: &str, now: i64) -> Result<Entitlement> {
    let license = find_active_license_for_owner(conn, owner_id)?;
    Ok(evaluate(license.as_ref(), now))
}

// ============ Redemption ============

/// Redeem a license key for an owner.
///
/// The write is conditioned on `owner_id` still being NULL so two concurrent
/// redemption attempts on the same key cannot both succeed; losing attempts
/// are diagnosed into the precise business outcome afterwards. Revocation is
/// checked ahead of ownership, matching the user-facing message precedence.
pub fn redeem_license(conn: &Connection, key: &str, owner_id: &str) -> Result<RedeemOutcome> {
    let redeemed_at = now();

    let affected = conn.execute(
        "UPDATE licenses SET owner_id = ?1, redeemed_at = ?2
         WHERE key = ?3 AND owner_id IS NULL AND is_active = 1",
        params![owner_id, redeemed_at, key],
    )?;

    if affected == 1 {
        let license = find_by_key(conn, key)?
            .ok_or_else(|| AppError::Internal("Redeemed license disappeared".into()))?;
        return Ok(RedeemOutcome::Redeemed(license));
    }

    // The guard rejected the write; figure out why.
    match find_by_key(conn, key)? {
        None => Ok(RedeemOutcome::NotFound),
        Some(license) if !license.is_active => Ok(RedeemOutcome::Revoked),
        Some(license) if license.owner_id.is_some() => Ok(RedeemOutcome::AlreadyRedeemed),
        Some(_) => Err(AppError::Internal(
            "License state changed during redemption".into(),
        )),
    }
}

// ============ HWID ============

/// Bind a hardware id, conditioned on no hwid being bound yet.
///
/// Returns false when another binding won in the meantime; the caller
/// re-reads and re-runs the policy.
pub fn bind_hwid(conn: &Connection, license_id: &str, hwid: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE licenses SET hwid = ?1 WHERE id = ?2 AND hwid IS NULL",
        params![hwid, license_id],
    )?;
    Ok(affected > 0)
}

/// Record a HWID mismatch observation for audit. Login proceeds regardless.
pub fn record_hwid_conflict(
    conn: &Connection,
    license_id: &str,
    bound_hwid: &str,
    reported_hwid: &str,
) -> Result<HwidConflict> {
    let id = gen_id();
    let observed_at = now();

    conn.execute(
        "INSERT INTO hwid_conflicts (id, license_id, bound_hwid, reported_hwid, observed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, license_id, bound_hwid, reported_hwid, observed_at],
    )?;

    Ok(HwidConflict {
        id,
        license_id: license_id.to_string(),
        bound_hwid: bound_hwid.to_string(),
        reported_hwid: reported_hwid.to_string(),
        observed_at,
    })
}

pub fn list_hwid_conflicts(conn: &Connection, license_id: &str) -> Result<Vec<HwidConflict>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM hwid_conflicts WHERE license_id = ?1 ORDER BY observed_at DESC",
            HWID_CONFLICT_COLS
        ),
        &[&license_id],
    )
}

// ============ Administrative mutations ============

/// Revoke a license. Returns the updated row, or None when the key is
/// unknown.
pub fn revoke_license(conn: &Connection, key: &str) -> Result<Option<LicenseRecord>> {
    update_returning(
        conn,
        "UPDATE licenses SET is_active = 0 WHERE key = ?1",
        key,
    )
}

/// Explicit administrative re-activation. Never happens automatically.
pub fn reactivate_license(conn: &Connection, key: &str) -> Result<Option<LicenseRecord>> {
    update_returning(
        conn,
        "UPDATE licenses SET is_active = 1 WHERE key = ?1",
        key,
    )
}

/// Administrative HWID reset; re-opens the bind path on next login.
pub fn reset_hwid(conn: &Connection, key: &str) -> Result<Option<LicenseRecord>> {
    update_returning(conn, "UPDATE licenses SET hwid = NULL WHERE key = ?1", key)
}

fn update_returning(conn: &Connection, sql: &str, key: &str) -> Result<Option<LicenseRecord>> {
    conn.query_row(
        &format!("{} RETURNING {}", sql, LICENSE_COLS),
        params![key],
        LicenseRecord::from_row,
    )
    .optional()
    .map_err(Into::into)
}
