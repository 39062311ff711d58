use serde::Serialize;
use thiserror::Error;

use crate::capabilities::CapabilityResolver;
use crate::ranks::{Rank, outranks};
use crate::roles::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: {actor} (rank {actor_rank}) does not outrank {target} (rank {target_rank})")]
    Outranked {
        actor: String,
        actor_rank: Rank,
        target: String,
        target_rank: Rank,
    },
}

/// User/employee management guard: an actor may only manage strictly
/// lower-ranked principals.
pub fn ensure_can_manage(actor: &Role, target: &Role) -> Result<(), AuthzError> {
    if outranks(actor, target) {
        return Ok(());
    }
    tracing::warn!(actor = %actor, target = %target, "management denied by rank");
    Err(AuthzError::Outranked {
        actor: actor.to_string(),
        actor_rank: actor.rank(),
        target: target.to_string(),
        target_rank: target.rank(),
    })
}

/// Fail with [`AuthzError::Forbidden`] unless `granted`.
pub fn require(granted: bool, module_code: &str) -> Result<(), AuthzError> {
    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(module_code.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grant Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Where a grant decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    /// The role carries the universal grant.
    Wildcard,
    /// An explicit matrix row decided.
    MatrixRow,
    /// No row yet: the level's rank decided.
    RankDefault,
    UnknownModule,
    UnknownLevel,
    UserNotFound,
}

/// Why `can(user, module)` answered the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub module_code: String,
    pub granted: bool,
    pub source: GrantSource,
    pub role: Option<String>,
    pub rank: Option<Rank>,
    pub reason: String,
}

impl AccessExplanation {
    pub fn user_not_found(module_code: &str) -> Self {
        Self {
            module_code: module_code.to_string(),
            granted: false,
            source: GrantSource::UserNotFound,
            role: None,
            rank: None,
            reason: "user not found".to_string(),
        }
    }

    /// Explanation for a user whose role is known to the caller.
    pub fn for_role(role: &Role, module_code: &str, granted: bool, source: GrantSource) -> Self {
        let reason = match source {
            GrantSource::Wildcard => format!("role {role} carries the wildcard grant"),
            GrantSource::MatrixRow => format!(
                "matrix row for level {role} {} '{module_code}'",
                if granted { "grants" } else { "denies" }
            ),
            GrantSource::RankDefault => format!(
                "no matrix row yet; rank {} {} the default grant",
                role.rank(),
                if granted { "meets" } else { "is below" }
            ),
            GrantSource::UnknownModule => format!("module '{module_code}' is not registered"),
            GrantSource::UnknownLevel => format!("no permission level is registered for role {role}"),
            GrantSource::UserNotFound => "user not found".to_string(),
        };
        Self {
            module_code: module_code.to_string(),
            granted,
            source,
            role: Some(role.to_string()),
            rank: Some(role.rank()),
            reason,
        }
    }
}

/// Shortcut used ahead of any matrix lookup.
pub fn wildcard_explanation(role: &Role, module_code: &str) -> Option<AccessExplanation> {
    CapabilityResolver::standard()
        .has_wildcard(role)
        .then(|| AccessExplanation::for_role(role, module_code, true, GrantSource::Wildcard))
}
