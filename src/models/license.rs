use serde::{Deserialize, Serialize};

/// Plan stored on a license row. Determines whether `expires_at` is
/// meaningful: lifetime licenses never expire, monthly licenses must carry an
/// expiry timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicensePlan {
    Lifetime,
    /// Accepts "premium" on the wire as a legacy alias.
    #[serde(alias = "premium")]
    Monthly,
}

impl LicensePlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifetime => "lifetime",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for LicensePlan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lifetime" => Ok(Self::Lifetime),
            "monthly" | "premium" => Ok(Self::Monthly),
            _ => Err(()),
        }
    }
}

/// A license row. `owner_id` transitions null -> set exactly once (at
/// redemption); `hwid` transitions null -> set once under normal operation;
/// `is_active = false` means administratively revoked and dominates every
/// other field during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    pub id: String,
    pub key: String,
    pub plan: LicensePlan,
    pub owner_id: Option<String>,
    pub hwid: Option<String>,
    pub is_active: bool,
    pub expires_at: Option<i64>,
    pub redeemed_at: Option<i64>,
    /// Issuing admin/bot, audit-only.
    pub created_by: String,
    pub created_at: i64,
}

/// Input for the administrative "issue key" action.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLicense {
    pub plan: LicensePlan,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub created_by: String,
}

/// Outcome of a redemption attempt. Not-found, revoked, and already-redeemed
/// are expected business outcomes, not store failures, so callers can render
/// a precise message for each.
#[derive(Debug)]
pub enum RedeemOutcome {
    Redeemed(LicenseRecord),
    NotFound,
    Revoked,
    AlreadyRedeemed,
}

/// An observed HWID mismatch, recorded for support audit. The bound value is
/// never overwritten by a conflicting report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HwidConflict {
    pub id: String,
    pub license_id: String,
    pub bound_hwid: String,
    pub reported_hwid: String,
    pub observed_at: i64,
}
