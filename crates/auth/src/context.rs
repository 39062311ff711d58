//! Operating-context rules.
//!
//! A principal is affiliated with a company (and optionally a project and a
//! site). Each request names the context it wants to act in; whether that is
//! acceptable depends on the principal's [`ScopeTier`]. This module decides;
//! loading the principal and recording audit events belong to the caller.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use gestor_core::{CompanyId, ProjectId, SiteId};

use crate::capabilities::CapabilityResolver;
use crate::roles::{Role, ScopeTier};

/// Where a user is registered to work. Immutable for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    /// Required for every non-global role; a missing company fails closed.
    pub company_id: Option<CompanyId>,
    pub project_id: Option<ProjectId>,
    pub site_id: Option<SiteId>,
}

impl Affiliation {
    pub fn company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Default::default()
        }
    }

    pub fn project(company_id: CompanyId, project_id: ProjectId) -> Self {
        Self {
            company_id: Some(company_id),
            project_id: Some(project_id),
            site_id: None,
        }
    }

    pub fn site(company_id: CompanyId, project_id: ProjectId, site_id: SiteId) -> Self {
        Self {
            company_id: Some(company_id),
            project_id: Some(project_id),
            site_id: Some(site_id),
        }
    }
}

/// The context a request claims to operate in. Untrusted until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionContext {
    pub company_id: Option<CompanyId>,
    pub project_id: Option<ProjectId>,
    pub site_id: Option<SiteId>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }
}

/// Why a context was refused.
///
/// `code()` and `message()` are stable: the UI branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    UserNotFound,
    ProjectRequired,
    SiteRequired,
    CompanyBoundary,
    ProjectBoundary,
    ProjectNotPermitted,
    MissingAffiliation,
    NoLinkedContext,
    CompanyContextInvalid,
    ProjectContextInvalid,
    SiteContextInvalid,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::UserNotFound => "user_not_found",
            DenialReason::ProjectRequired => "project_required",
            DenialReason::SiteRequired => "site_required",
            DenialReason::CompanyBoundary => "company_boundary",
            DenialReason::ProjectBoundary => "project_boundary",
            DenialReason::ProjectNotPermitted => "project_not_permitted",
            DenialReason::MissingAffiliation => "missing_affiliation",
            DenialReason::NoLinkedContext => "no_linked_context",
            DenialReason::CompanyContextInvalid => "company_context_invalid",
            DenialReason::ProjectContextInvalid => "project_context_invalid",
            DenialReason::SiteContextInvalid => "site_context_invalid",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenialReason::UserNotFound => "user not found",
            DenialReason::ProjectRequired => "project required: project managers must select a project",
            DenialReason::SiteRequired => "site required for your access level",
            DenialReason::CompanyBoundary => "you may only select projects of your registered company",
            DenialReason::ProjectBoundary => "you must stay within your registered project",
            DenialReason::ProjectNotPermitted => "this project is not in your permitted project list",
            DenialReason::MissingAffiliation => {
                "your account has no registered company or project; contact an administrator"
            }
            DenialReason::NoLinkedContext => {
                "access blocked: your account has no company, project or site linked; contact support"
            }
            DenialReason::CompanyContextInvalid => "invalid company context for your user",
            DenialReason::ProjectContextInvalid => "invalid project context for your user",
            DenialReason::SiteContextInvalid => "invalid site context for your user",
        }
    }
}

impl core::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for DenialReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DenialReason", 2)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", self.message())?;
        s.end()
    }
}

/// Outcome of evaluating a requested context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDecision {
    Allow,
    Deny(DenialReason),
    /// Denied, and the attempt itself is an anomaly that must be audited.
    Blocked(DenialReason),
}

impl ContextDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ContextDecision::Allow)
    }

    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            ContextDecision::Allow => None,
            ContextDecision::Deny(r) | ContextDecision::Blocked(r) => Some(*r),
        }
    }

    pub fn requires_audit(&self) -> bool {
        matches!(self, ContextDecision::Blocked(_))
    }
}

/// Wire result of a context validation: `{ "valid": bool, "reason": {..} }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
}

impl ContextValidation {
    pub fn allowed() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

impl From<ContextDecision> for ContextValidation {
    fn from(decision: ContextDecision) -> Self {
        match decision.reason() {
            None => Self::allowed(),
            Some(reason) => Self::denied(reason),
        }
    }
}

/// Everything the rules need to know about the principal.
#[derive(Debug, Clone, Copy)]
pub struct ScopeSubject<'a> {
    pub role: &'a Role,
    pub affiliation: Option<&'a Affiliation>,
    /// When set, a project manager may only pick one of these projects.
    pub allowed_projects: Option<&'a [ProjectId]>,
}

/// Effective scope tier: the wildcard always counts as global.
pub fn scope_tier(role: &Role) -> ScopeTier {
    if CapabilityResolver::standard().has_wildcard(role) {
        return ScopeTier::Global;
    }
    role.scope()
}

/// Decide whether `subject` may operate in `requested`.
///
/// The request is judged as a whole: one diverging field denies it regardless
/// of what else was supplied.
pub fn evaluate(subject: ScopeSubject<'_>, requested: &SelectionContext) -> ContextDecision {
    match scope_tier(subject.role) {
        ScopeTier::Global => ContextDecision::Allow,
        ScopeTier::Company => evaluate_company(subject, requested),
        ScopeTier::Project => evaluate_project(subject, requested),
        ScopeTier::Site => evaluate_site(subject, requested),
        ScopeTier::Fixed => evaluate_fixed(subject, requested),
    }
}

fn evaluate_company(subject: ScopeSubject<'_>, requested: &SelectionContext) -> ContextDecision {
    let Some(company_id) = subject.affiliation.and_then(|a| a.company_id) else {
        return ContextDecision::Deny(DenialReason::MissingAffiliation);
    };
    if requested.company_id != Some(company_id) {
        return ContextDecision::Deny(DenialReason::CompanyBoundary);
    }
    ContextDecision::Allow
}

fn evaluate_project(subject: ScopeSubject<'_>, requested: &SelectionContext) -> ContextDecision {
    let Some(company_id) = subject.affiliation.and_then(|a| a.company_id) else {
        return ContextDecision::Deny(DenialReason::MissingAffiliation);
    };
    let Some(project_id) = requested.project_id else {
        return ContextDecision::Deny(DenialReason::ProjectRequired);
    };
    if requested.company_id != Some(company_id) {
        return ContextDecision::Deny(DenialReason::CompanyBoundary);
    }
    if let Some(allowed) = subject.allowed_projects {
        if !allowed.contains(&project_id) {
            return ContextDecision::Deny(DenialReason::ProjectNotPermitted);
        }
    }
    ContextDecision::Allow
}

fn evaluate_site(subject: ScopeSubject<'_>, requested: &SelectionContext) -> ContextDecision {
    let Some((company_id, project_id)) = subject
        .affiliation
        .and_then(|a| Some((a.company_id?, a.project_id?)))
    else {
        return ContextDecision::Deny(DenialReason::MissingAffiliation);
    };
    if requested.company_id != Some(company_id) || requested.project_id != Some(project_id) {
        return ContextDecision::Deny(DenialReason::ProjectBoundary);
    }
    if requested.site_id.is_none() {
        return ContextDecision::Deny(DenialReason::SiteRequired);
    }
    ContextDecision::Allow
}

fn evaluate_fixed(subject: ScopeSubject<'_>, requested: &SelectionContext) -> ContextDecision {
    // Locked accounts need the full company/project/site chain.
    let Some((company_id, project_id, site_id)) = subject
        .affiliation
        .and_then(|a| Some((a.company_id?, a.project_id?, a.site_id?)))
    else {
        return ContextDecision::Blocked(DenialReason::NoLinkedContext);
    };
    if requested.company_id.is_some_and(|id| id != company_id) {
        return ContextDecision::Deny(DenialReason::CompanyContextInvalid);
    }
    if requested.project_id.is_some_and(|id| id != project_id) {
        return ContextDecision::Deny(DenialReason::ProjectContextInvalid);
    }
    if requested.site_id.is_some_and(|id| id != site_id) {
        return ContextDecision::Deny(DenialReason::SiteContextInvalid);
    }
    ContextDecision::Allow
}
