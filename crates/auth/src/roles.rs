//! Role identifiers and the tier table.
//!
//! Every known role has exactly one row in [`TIERS`]: its canonical name, the
//! legacy spellings that still appear in tenant data, its rank, the scope it is
//! allowed to operate in and the capability flags it declares on its own
//! (inherited flags are computed by the resolver). Adding a role means adding
//! a variant and a row here.

use serde::{Deserialize, Serialize};

use crate::capabilities::WILDCARD;
use crate::ranks::Rank;

/// How far a role may move between companies, projects and sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeTier {
    /// Any company, project or site.
    Global,
    /// Anything inside the registered company.
    Company,
    /// Projects of the registered company.
    Project,
    /// Sites of the registered project.
    Site,
    /// Locked to the registered affiliation.
    Fixed,
}

/// Static description of one role tier.
#[derive(Debug)]
pub struct RoleTier {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub rank: Rank,
    pub scope: ScopeTier,
    pub flags: &'static [&'static str],
}

/// The tier table, highest rank first.
pub const TIERS: [RoleTier; 10] = [
    RoleTier {
        name: "HELPER_SYSTEM",
        aliases: &[],
        rank: Rank::new(2000),
        scope: ScopeTier::Global,
        flags: &[WILDCARD],
    },
    RoleTier {
        name: "ADMIN",
        aliases: &["SUPER_ADMIN_GOD"],
        rank: Rank::new(1500),
        scope: ScopeTier::Global,
        flags: &[WILDCARD],
    },
    RoleTier {
        name: "TI_SOFTWARE",
        aliases: &["TISOFTWARE", "SOCIO_DIRETOR", "MANAGER", "MODERATOR"],
        rank: Rank::new(1200),
        scope: ScopeTier::Global,
        flags: &["db_hub.manage", "custom_su.manage", "showMaintenance"],
    },
    RoleTier {
        name: "COMPANY_ADMIN",
        aliases: &[],
        rank: Rank::new(1000),
        scope: ScopeTier::Company,
        flags: &[
            "users.manage",
            "companies.view",
            "companies.manage",
            "projects.manage",
            "audit_logs.view",
            "settings.mfa",
        ],
    },
    RoleTier {
        name: "PROJECT_MANAGER",
        aliases: &["GESTOR_PROJECT"],
        rank: Rank::new(800),
        scope: ScopeTier::Project,
        flags: &["projects.progress", "functions.manage", "showAdminMenu"],
    },
    RoleTier {
        name: "SITE_MANAGER",
        aliases: &["GESTOR_CANTEIRO"],
        rank: Rank::new(700),
        scope: ScopeTier::Site,
        flags: &["projects.view", "sites.view", "employees.manage", "viewer_3d.view"],
    },
    RoleTier {
        name: "SUPERVISOR",
        aliases: &[],
        rank: Rank::new(600),
        scope: ScopeTier::Site,
        flags: &["team_composition", "work_progress.view"],
    },
    RoleTier {
        name: "OPERATIONAL",
        aliases: &["WORKER", "OPERATOR"],
        rank: Rank::new(100),
        scope: ScopeTier::Fixed,
        flags: &["clock", "daily_reports", "time_records.view"],
    },
    RoleTier {
        name: "VIEWER",
        aliases: &["USER"],
        rank: Rank::new(50),
        scope: ScopeTier::Fixed,
        flags: &["settings.profile"],
    },
    RoleTier {
        name: "GUEST",
        aliases: &[],
        rank: Rank::new(10),
        scope: ScopeTier::Fixed,
        flags: &[],
    },
];

/// Role of a principal.
///
/// Roles arrive as free-form strings from tenant data. Parsing is
/// case-insensitive and maps legacy spellings onto the canonical variant;
/// anything else is kept as [`Role::Unknown`] (canonicalized) and carries no
/// rank and no flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    HelperSystem,
    Admin,
    TiSoftware,
    CompanyAdmin,
    ProjectManager,
    SiteManager,
    Supervisor,
    Operational,
    Viewer,
    Guest,
    Unknown(String),
}

impl Role {
    /// Every known role, highest rank first (same order as [`TIERS`]).
    pub const KNOWN: [Role; 10] = [
        Role::HelperSystem,
        Role::Admin,
        Role::TiSoftware,
        Role::CompanyAdmin,
        Role::ProjectManager,
        Role::SiteManager,
        Role::Supervisor,
        Role::Operational,
        Role::Viewer,
        Role::Guest,
    ];

    pub fn parse(raw: &str) -> Self {
        let canonical = canonicalize(raw);
        TIERS
            .iter()
            .position(|t| t.name == canonical || t.aliases.contains(&canonical.as_str()))
            .map(|idx| Self::KNOWN[idx].clone())
            .unwrap_or(Role::Unknown(canonical))
    }

    /// Index of this role's row in [`TIERS`].
    pub fn tier_index(&self) -> Option<usize> {
        let idx = match self {
            Role::HelperSystem => 0,
            Role::Admin => 1,
            Role::TiSoftware => 2,
            Role::CompanyAdmin => 3,
            Role::ProjectManager => 4,
            Role::SiteManager => 5,
            Role::Supervisor => 6,
            Role::Operational => 7,
            Role::Viewer => 8,
            Role::Guest => 9,
            Role::Unknown(_) => return None,
        };
        Some(idx)
    }

    pub fn tier(&self) -> Option<&'static RoleTier> {
        self.tier_index().map(|idx| &TIERS[idx])
    }

    pub fn is_known(&self) -> bool {
        self.tier_index().is_some()
    }

    pub fn rank(&self) -> Rank {
        self.tier().map(|t| t.rank).unwrap_or(Rank::ZERO)
    }

    /// Unknown roles are fixed-scope: they never get to choose a context.
    pub fn scope(&self) -> ScopeTier {
        self.tier().map(|t| t.scope).unwrap_or(ScopeTier::Fixed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Unknown(name) => name,
            known => known.tier().map(|t| t.name).unwrap_or_default(),
        }
    }
}

fn canonicalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}
