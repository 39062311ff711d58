//! Hierarchy ranks.
//!
//! A rank is the numeric trust level of a role: higher ranks structurally
//! outrank lower ones. Unknown roles rank [`Rank::ZERO`].

use serde::{Deserialize, Serialize};

use crate::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(u32);

impl Rank {
    pub const ZERO: Rank = Rank(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Rank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Roles at or above this rank bypass every scope and matrix check.
pub const GOD_RANK: Rank = Rank(1500);

/// Roles at or above this rank own global/templated resources that are not
/// tied to a company.
pub const SYSTEM_OWNER_RANK: Rank = Rank(1200);

/// Roles at or above this rank choose their operating context freely.
pub const GLOBAL_MANAGEMENT_RANK: Rank = Rank(1200);

/// Permission levels at or above this rank are granted every module unless a
/// matrix row says otherwise.
pub const DEFAULT_GRANT_RANK: Rank = Rank(1500);

pub fn rank_of(role: &Role) -> Rank {
    role.rank()
}

pub fn is_god(role: &Role) -> bool {
    rank_of(role) >= GOD_RANK
}

pub fn is_owner(role: &Role) -> bool {
    rank_of(role) >= SYSTEM_OWNER_RANK
}

pub fn is_global_management(role: &Role) -> bool {
    rank_of(role) >= GLOBAL_MANAGEMENT_RANK
}

/// `a` may act on `b` only when strictly higher ranked.
pub fn outranks(a: &Role, b: &Role) -> bool {
    rank_of(a) > rank_of(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_has_lowest_trust() {
        let role = Role::parse("mystery");
        assert_eq!(rank_of(&role), Rank::ZERO);
        assert!(!outranks(&role, &Role::Guest));
        assert!(outranks(&Role::Guest, &role));
    }

    #[test]
    fn owner_threshold_sits_below_god_threshold() {
        assert!(SYSTEM_OWNER_RANK < GOD_RANK);
        assert!(is_owner(&Role::TiSoftware));
        assert!(!is_god(&Role::TiSoftware));
        assert!(is_god(&Role::Admin));
        assert!(!is_owner(&Role::CompanyAdmin));
    }

    #[test]
    fn outranks_is_strict() {
        assert!(outranks(&Role::ProjectManager, &Role::SiteManager));
        assert!(!outranks(&Role::SiteManager, &Role::SiteManager));
        assert!(!outranks(&Role::Supervisor, &Role::SiteManager));
    }

    #[test]
    fn aliases_share_the_canonical_rank() {
        assert_eq!(rank_of(&Role::parse("GESTOR_PROJECT")), Rank::new(800));
        assert_eq!(rank_of(&Role::parse("helper_system")), Rank::new(2000));
        assert!(is_owner(&Role::parse("SOCIO_DIRETOR")));
        assert!(is_global_management(&Role::parse("MODERATOR")));
    }
}
