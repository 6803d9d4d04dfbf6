//! Role sync projection: maps an evaluated entitlement onto the Discord role
//! changes needed to reflect it.
//!
//! The two paid roles are mutually exclusive; a member holds at most one.
//! Revokes are applied before the grant so both paid roles are never held
//! at once, even transiently.

use crate::entitlement::{Entitlement, PlanTier};

/// The two paid Discord roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRole {
    Monthly,
    Lifetime,
}

impl PlanRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Lifetime => "lifetime",
        }
    }
}

/// Role changes to apply for one member. `revoke` is applied first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChangeSet {
    pub grant: Option<PlanRole>,
    pub revoke: Vec<PlanRole>,
}

/// Project an entitlement onto role changes.
///
/// Entitled lifetime members get the lifetime role and lose the monthly one;
/// entitled monthly members the reverse. Everyone else (free, expired,
/// revoked) loses both, best-effort.
pub fn project_roles(entitlement: &Entitlement) -> RoleChangeSet {
    match (entitlement.is_premium, entitlement.plan) {
        (true, PlanTier::Lifetime) => RoleChangeSet {
            grant: Some(PlanRole::Lifetime),
            revoke: vec![PlanRole::Monthly],
        },
        (true, PlanTier::Premium) => RoleChangeSet {
            grant: Some(PlanRole::Monthly),
            revoke: vec![PlanRole::Lifetime],
        },
        _ => RoleChangeSet {
            grant: None,
            revoke: vec![PlanRole::Monthly, PlanRole::Lifetime],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::Entitlement;

    fn entitlement(is_premium: bool, plan: PlanTier) -> Entitlement {
        Entitlement {
            is_premium,
            plan,
            expires_at: None,
        }
    }

    #[test]
    fn lifetime_grants_lifetime_and_revokes_monthly() {
        let changes = project_roles(&entitlement(true, PlanTier::Lifetime));
        assert_eq!(changes.grant, Some(PlanRole::Lifetime));
        assert_eq!(changes.revoke, vec![PlanRole::Monthly]);
    }

    #[test]
    fn monthly_grants_monthly_and_revokes_lifetime() {
        let changes = project_roles(&entitlement(true, PlanTier::Premium));
        assert_eq!(changes.grant, Some(PlanRole::Monthly));
        assert_eq!(changes.revoke, vec![PlanRole::Lifetime]);
    }

    #[test]
    fn free_revokes_both_and_grants_nothing() {
        let changes = project_roles(&entitlement(false, PlanTier::Free));
        assert_eq!(changes.grant, None);
        assert_eq!(changes.revoke, vec![PlanRole::Monthly, PlanRole::Lifetime]);
    }

    #[test]
    fn grant_is_never_also_revoked() {
        for ent in [
            entitlement(true, PlanTier::Lifetime),
            entitlement(true, PlanTier::Premium),
            entitlement(false, PlanTier::Free),
        ] {
            let changes = project_roles(&ent);
            if let Some(granted) = changes.grant {
                assert!(
                    !changes.revoke.contains(&granted),
                    "grant {:?} must not appear in revoke set",
                    granted
                );
            }
        }
    }
}
