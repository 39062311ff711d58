//! `gestor-auth`: pure authorization policy for the back office.
//!
//! Roles, ranks, capability flags, operating-context rules and the permission
//! matrix defaults. Decoupled from storage and transport: no IO, no panics.

pub mod authorize;
pub mod capabilities;
pub mod context;
pub mod matrix;
pub mod options;
pub mod permissions_map;
pub mod ranks;
pub mod roles;

pub use authorize::{AccessExplanation, AuthzError, GrantSource, ensure_can_manage, require};
pub use capabilities::{Capability, CapabilityResolver, CapabilitySet, WILDCARD, has_wildcard, resolve};
pub use context::{
    Affiliation, ContextDecision, ContextValidation, DenialReason, ScopeSubject, SelectionContext,
    evaluate,
};
pub use matrix::{MatrixEntry, PermissionLevel, PermissionModule, default_grant, parent_code};
pub use options::{
    CompanySummary, ContextOptions, OptionsScope, ProjectSummary, SiteSummary, options_scope,
};
pub use permissions_map::{DASHBOARD, PROTECTED_FLAG, effective_permissions};
pub use ranks::{Rank, is_god, is_global_management, is_owner, outranks, rank_of};
pub use roles::{Role, RoleTier, ScopeTier, TIERS};
