//! Repository interfaces the access engine consumes.
//!
//! Persistence is owned by the host application; the engine only sees these
//! traits. Every lookup returns `Ok(None)` for a miss and `Err` only when the
//! backing store itself fails.

pub mod in_memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gestor_auth::{
    Affiliation, CompanySummary, MatrixEntry, PermissionLevel, PermissionModule, ProjectSummary,
    Role, SiteSummary,
};
use gestor_core::{LevelId, ModuleId, ProjectId, UserId};

use crate::audit::AuditEvent;

pub use in_memory::{
    InMemoryAuditSink, InMemoryContextCatalog, InMemoryPermissionStore, InMemoryUserDirectory,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Unavailable(format!("{what} lock poisoned"))
    }
}

/// What the engine needs to know about an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub role: Role,
    pub affiliation: Option<Affiliation>,
    /// Restricts a project manager to these projects when set.
    #[serde(default)]
    pub allowed_projects: Option<Vec<ProjectId>>,
    /// Per-user `code -> granted` overrides applied on top of the role.
    #[serde(default)]
    pub permission_overrides: BTreeMap<String, bool>,
}

impl UserRecord {
    pub fn new(role: impl Into<Role>, affiliation: Option<Affiliation>) -> Self {
        Self {
            id: UserId::new(),
            role: role.into(),
            affiliation,
            allowed_projects: None,
            permission_overrides: BTreeMap::new(),
        }
    }

    pub fn with_allowed_projects(mut self, projects: Vec<ProjectId>) -> Self {
        self.allowed_projects = Some(projects);
        self
    }

    pub fn with_override(mut self, code: impl Into<String>, granted: bool) -> Self {
        self.permission_overrides.insert(code.into(), granted);
        self
    }
}

pub trait UserDirectory: Send + Sync {
    fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError>;
}

/// Full company/project/site catalog, unfiltered.
pub trait ContextCatalog: Send + Sync {
    fn companies(&self) -> Result<Vec<CompanySummary>, StoreError>;
    fn projects(&self) -> Result<Vec<ProjectSummary>, StoreError>;
    fn sites(&self) -> Result<Vec<SiteSummary>, StoreError>;
}

/// Levels, modules and the grant rows between them.
pub trait PermissionStore: Send + Sync {
    fn level(&self, level_id: LevelId) -> Result<Option<PermissionLevel>, StoreError>;

    /// Case-insensitive lookup by level name.
    fn level_by_name(&self, name: &str) -> Result<Option<PermissionLevel>, StoreError>;

    fn module(&self, module_id: ModuleId) -> Result<Option<PermissionModule>, StoreError>;

    fn module_by_code(&self, code: &str) -> Result<Option<PermissionModule>, StoreError>;

    /// Highest rank first.
    fn levels(&self) -> Result<Vec<PermissionLevel>, StoreError>;

    /// Ordered by code.
    fn modules(&self) -> Result<Vec<PermissionModule>, StoreError>;

    fn entry(&self, level_id: LevelId, module_id: ModuleId) -> Result<Option<MatrixEntry>, StoreError>;

    fn entries(&self) -> Result<Vec<MatrixEntry>, StoreError>;

    fn entries_for_level(&self, level_id: LevelId) -> Result<Vec<MatrixEntry>, StoreError>;

    /// Insert or overwrite the row for `(level_id, module_id)`.
    fn upsert_entry(&self, entry: MatrixEntry) -> Result<(), StoreError>;

    /// Insert unless a row exists; returns whichever row is stored afterwards.
    fn insert_entry_if_absent(&self, entry: MatrixEntry) -> Result<MatrixEntry, StoreError>;

    /// Upsert keyed by name. An existing level keeps its id.
    fn upsert_level(&self, level: PermissionLevel) -> Result<PermissionLevel, StoreError>;

    /// Upsert keyed by code. An existing module keeps its id.
    fn upsert_module(&self, module: PermissionModule) -> Result<PermissionModule, StoreError>;
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), StoreError>;
}
