//! HWID binding policy.
//!
//! A license is loosely bound to one physical machine via an opaque hardware
//! identifier reported by the desktop client at login. The policy is
//! deliberately lenient: a mismatch is recorded for audit and login proceeds,
//! tolerating account/device sharing.

use serde::Serialize;

/// What to do with a reported hardware id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HwidDecision {
    /// No hwid bound yet; the caller persists the reported value.
    Bind,
    /// Reported value matches the bound one; no-op.
    AlreadyBound,
    /// Mismatch. Never overwrites the bound value and never blocks login.
    Conflict,
}

/// How conflicts are handled. Only one policy exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwidConflictPolicy {
    /// Record the conflict for audit and let the login succeed.
    AllowWithAudit,
}

pub const CONFLICT_POLICY: HwidConflictPolicy = HwidConflictPolicy::AllowWithAudit;

/// Decide how to treat `reported` against the currently bound hwid.
pub fn decide(bound: Option<&str>, reported: &str) -> HwidDecision {
    match bound {
        None => HwidDecision::Bind,
        Some(bound) if bound == reported => HwidDecision::AlreadyBound,
        Some(_) => HwidDecision::Conflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_license_binds() {
        assert_eq!(decide(None, "hw-aaa"), HwidDecision::Bind);
    }

    #[test]
    fn matching_hwid_is_a_noop() {
        assert_eq!(decide(Some("hw-aaa"), "hw-aaa"), HwidDecision::AlreadyBound);
    }

    #[test]
    fn mismatch_is_a_conflict() {
        assert_eq!(decide(Some("hw-aaa"), "hw-bbb"), HwidDecision::Conflict);
    }
}
