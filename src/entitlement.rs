//! The entitlement evaluator: the single place that answers "is this account
//! currently allowed premium features".
//!
//! Every surface (dashboard, login bridge, role sync) goes through
//! [`evaluate`] instead of re-deriving expiry math, so the answer is
//! consistent everywhere. The function is pure: no I/O, deterministic given
//! its inputs, total over its domain. Data-integrity anomalies are flagged by
//! the fetch boundary (`db::queries::find_active_license_for_owner`), never
//! in here.

use serde::Serialize;

use crate::models::{LicensePlan, LicenseRecord};

/// Tier reported to callers. `Free` covers no license, revoked, and expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
    Lifetime,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Lifetime => "lifetime",
        }
    }
}

/// The computed, point-in-time entitlement answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub is_premium: bool,
    pub plan: PlanTier,
    pub expires_at: Option<i64>,
}

impl Entitlement {
    pub fn free() -> Self {
        Self {
            is_premium: false,
            plan: PlanTier::Free,
            expires_at: None,
        }
    }
}

/// Evaluate a license row (or its absence) into an entitlement at `now`.
///
/// Precedence: missing or revoked rows are free; lifetime is premium at every
/// `now`; a monthly plan is premium iff `expires_at > now` (strict). A
/// missing expiry on a monthly plan collapses to free rather than being
/// treated as eternal.
pub fn evaluate(license: Option<&LicenseRecord>, now: i64) -> Entitlement {
    let Some(license) = license else {
        return Entitlement::free();
    };

    if !license.is_active {
        return Entitlement::free();
    }

    match license.plan {
        LicensePlan::Lifetime => Entitlement {
            is_premium: true,
            plan: PlanTier::Lifetime,
            expires_at: None,
        },
        LicensePlan::Monthly => match license.expires_at {
            Some(expires_at) if expires_at > now => Entitlement {
                is_premium: true,
                plan: PlanTier::Premium,
                expires_at: Some(expires_at),
            },
            // Expired, or no expiry recorded on a time-boxed plan.
            _ => Entitlement::free(),
        },
    }
}
