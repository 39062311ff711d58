//! Capability flags and the role → flag resolver.

use std::borrow::Cow;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize, Serializer};

use crate::ranks::{GOD_RANK, Rank};
use crate::roles::{Role, TIERS};

/// The universal grant.
pub const WILDCARD: &str = "*";

/// One grantable action or feature (e.g. `"employees.manage"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The flags a role carries.
///
/// The wildcard is a distinct variant, never a `"*"` entry inside `Flags`, so
/// callers ask [`CapabilitySet::contains`] instead of searching for the magic
/// string themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilitySet {
    Omnipotent,
    /// Deduplicated, base-tier flags first.
    Flags(Vec<Capability>),
}

impl CapabilitySet {
    pub fn empty() -> Self {
        CapabilitySet::Flags(Vec::new())
    }

    pub fn is_omnipotent(&self) -> bool {
        matches!(self, CapabilitySet::Omnipotent)
    }

    pub fn contains(&self, flag: &str) -> bool {
        match self {
            CapabilitySet::Omnipotent => true,
            CapabilitySet::Flags(flags) => flags.iter().any(|f| f.as_str() == flag),
        }
    }

    /// Concrete flags (empty for [`CapabilitySet::Omnipotent`]).
    pub fn flags(&self) -> &[Capability] {
        match self {
            CapabilitySet::Omnipotent => &[],
            CapabilitySet::Flags(flags) => flags,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CapabilitySet::Omnipotent => 1,
            CapabilitySet::Flags(flags) => flags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wire form: `["*"]` for the wildcard, the flag list otherwise.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            CapabilitySet::Omnipotent => vec![WILDCARD.to_string()],
            CapabilitySet::Flags(flags) => flags.iter().map(|f| f.as_str().to_string()).collect(),
        }
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_strings().serialize(serializer)
    }
}

/// Resolves roles to their effective flags.
///
/// Resolution happens once, when the table is built: a non-god tier gets its
/// own declared flags plus those of every strictly lower tier. The table is
/// immutable afterwards.
#[derive(Debug)]
pub struct CapabilityResolver {
    sets: Vec<CapabilitySet>,
    empty: CapabilitySet,
}

impl CapabilityResolver {
    pub fn new() -> Self {
        let sets = TIERS
            .iter()
            .map(|tier| {
                if tier.rank >= GOD_RANK || tier.flags.contains(&WILDCARD) {
                    return CapabilitySet::Omnipotent;
                }
                CapabilitySet::Flags(inherited_flags(tier.rank))
            })
            .collect();

        tracing::debug!(tiers = TIERS.len(), "capability table resolved");

        Self {
            sets,
            empty: CapabilitySet::empty(),
        }
    }

    /// Process-wide resolver over the built-in tier table.
    pub fn standard() -> &'static CapabilityResolver {
        static RESOLVER: OnceLock<CapabilityResolver> = OnceLock::new();
        RESOLVER.get_or_init(CapabilityResolver::new)
    }

    /// Unknown roles resolve to the empty set.
    pub fn resolve(&self, role: &Role) -> &CapabilitySet {
        role.tier_index()
            .and_then(|idx| self.sets.get(idx))
            .unwrap_or(&self.empty)
    }

    pub fn has_wildcard(&self, role: &Role) -> bool {
        self.resolve(role).is_omnipotent()
    }
}

impl Default for CapabilityResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn inherited_flags(rank: Rank) -> Vec<Capability> {
    let mut out: Vec<Capability> = Vec::new();
    // TIERS is sorted by rank descending; walk it upwards from the base tier.
    for tier in TIERS.iter().rev().filter(|t| t.rank <= rank) {
        for flag in tier.flags.iter().filter(|f| **f != WILDCARD) {
            if !out.iter().any(|c| c.as_str() == *flag) {
                out.push(Capability::new(*flag));
            }
        }
    }
    out
}

/// Resolve a raw role string against the standard table.
pub fn resolve(role: &str) -> CapabilitySet {
    CapabilityResolver::standard()
        .resolve(&Role::parse(role))
        .clone()
}

pub fn has_wildcard(role: &str) -> bool {
    CapabilityResolver::standard().has_wildcard(&Role::parse(role))
}
