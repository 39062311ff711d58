//! The entry point route handlers call.
//!
//! Orchestration only: scope rules live in `gestor_auth::context`, grant
//! rules in the matrix engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use gestor_auth::{
    AccessExplanation, CapabilityResolver, ContextOptions, ContextValidation, GrantSource,
    MatrixEntry, Role, SelectionContext, authorize, effective_permissions, ensure_can_manage,
};
use gestor_core::{DomainError, UserId};
use gestor_infra::matrix_tasks::{InMemoryTaskStore, MatrixUpdateTask, TaskId, TaskStatus, TaskStore, WorkerStats};
use gestor_infra::{
    AuditSink, CacheStats, ContextCatalog, DecisionCache, InMemoryAuditSink, InMemoryContextCatalog,
    InMemoryPermissionStore, InMemoryUserDirectory, PermissionStore, UserDirectory, UserRecord,
};

use crate::config::AccessConfig;
use crate::context_options::ContextOptionsResolver;
use crate::context_validator::ContextValidator;
use crate::error::AccessResult;
use crate::matrix_engine::{PermissionMatrix, PermissionMatrixEngine};
use crate::seed::{SeedReport, seed_standard_catalog};

/// Everything the engine reads from or writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub catalog: Arc<dyn ContextCatalog>,
    pub permissions: Arc<dyn PermissionStore>,
    pub audit: Arc<dyn AuditSink>,
    pub tasks: Arc<dyn TaskStore>,
}

/// In-memory collaborators, with concrete handles kept for seeding and
/// inspection.
#[derive(Clone, Default)]
pub struct InMemoryCollaborators {
    pub users: Arc<InMemoryUserDirectory>,
    pub catalog: Arc<InMemoryContextCatalog>,
    pub permissions: Arc<InMemoryPermissionStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub tasks: Arc<InMemoryTaskStore>,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            users: self.users.clone(),
            catalog: self.catalog.clone(),
            permissions: self.permissions.clone(),
            audit: self.audit.clone(),
            tasks: self.tasks.clone(),
        }
    }
}

pub struct AccessControl {
    users: Arc<dyn UserDirectory>,
    permissions: Arc<dyn PermissionStore>,
    validator: ContextValidator,
    options: ContextOptionsResolver,
    engine: PermissionMatrixEngine,
}

impl AccessControl {
    pub fn new(collaborators: Collaborators, config: &AccessConfig) -> AccessResult<Self> {
        let Collaborators {
            users,
            catalog,
            permissions,
            audit,
            tasks,
        } = collaborators;

        let matrix = Arc::new(PermissionMatrix::new(
            permissions.clone(),
            DecisionCache::new(config.cache_enabled),
        ));
        let engine = PermissionMatrixEngine::new(matrix, tasks, config)?;

        Ok(Self {
            validator: ContextValidator::new(users.clone(), audit),
            options: ContextOptionsResolver::new(users.clone(), catalog),
            users,
            permissions,
            engine,
        })
    }

    /// Seed the standard levels and modules, then materialize default rows.
    pub fn bootstrap(&self) -> AccessResult<SeedReport> {
        let mut report = seed_standard_catalog(self.permissions.as_ref())?;
        report.defaults_inserted = self.engine.matrix().ensure_defaults()?;
        Ok(report)
    }

    /// `hasWildcard(role) || isGranted(level(role), module(code))`.
    ///
    /// Unknown users, levels and modules are `false`; store failures are
    /// errors.
    pub fn can(&self, user_id: UserId, module_code: &str) -> AccessResult<bool> {
        let Some(user) = self.users.find_user(user_id)? else {
            warn!(user_id = %user_id, module = module_code, "access denied: user not found");
            return Ok(false);
        };
        self.can_role(&user.role, module_code)
    }

    /// Same decision for a role already loaded by the caller.
    pub fn can_role(&self, role: &Role, module_code: &str) -> AccessResult<bool> {
        if CapabilityResolver::standard().has_wildcard(role) {
            return Ok(true);
        }
        let Some(level) = self.permissions.level_by_name(role.as_str())? else {
            warn!(role = %role, module = module_code, "access denied: no permission level for role");
            return Ok(false);
        };
        let Some(module) = self.permissions.module_by_code(module_code)? else {
            warn!(role = %role, module = module_code, "access denied: unknown module");
            return Ok(false);
        };

        let granted = self.engine.is_granted(level.id, module.id)?;
        if granted {
            debug!(role = %role, module = module_code, "access granted");
        } else {
            warn!(role = %role, module = module_code, "access denied by matrix");
        }
        Ok(granted)
    }

    /// [`Self::can`], failing with `Forbidden` on a denial.
    pub fn require(&self, user_id: UserId, module_code: &str) -> AccessResult<()> {
        Ok(authorize::require(self.can(user_id, module_code)?, module_code)?)
    }

    pub fn validate_context(&self, user_id: UserId, requested: &SelectionContext) -> AccessResult<ContextValidation> {
        self.validator.validate(user_id, requested)
    }

    pub fn list_selectable_contexts(&self, user_id: UserId) -> AccessResult<ContextOptions> {
        self.options.options(user_id)
    }

    pub fn list_matrix(&self) -> AccessResult<Vec<MatrixEntry>> {
        self.engine.list_matrix()
    }

    pub fn queue_bulk_update(&self, entries: Vec<MatrixEntry>) -> AccessResult<TaskId> {
        self.engine.queue_bulk_update(entries)
    }

    pub fn task(&self, task_id: TaskId) -> AccessResult<Option<MatrixUpdateTask>> {
        self.engine.task(task_id)
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> AccessResult<Vec<MatrixUpdateTask>> {
        self.engine.list_tasks(status, limit)
    }

    /// Flattened permission map for the UI. `None` for unknown users.
    ///
    /// The map only drives menus and buttons. Role flags show up as granted
    /// even where the matrix row denies the code, so [`Self::can`] stays the
    /// authority for enforcement.
    pub fn effective_permissions(&self, user_id: UserId) -> AccessResult<Option<BTreeMap<String, bool>>> {
        let Some(user) = self.users.find_user(user_id)? else {
            return Ok(None);
        };
        let grants = match self.permissions.level_by_name(user.role.as_str())? {
            Some(level) => self.engine.matrix().level_grants(&level)?,
            None => Vec::new(),
        };
        let map = effective_permissions(
            &user.role,
            grants.iter().map(|(code, granted)| (code.as_str(), *granted)),
            &user.permission_overrides,
        );
        Ok(Some(map))
    }

    /// Why `can(user_id, module_code)` answers the way it does. Read-only.
    pub fn explain(&self, user_id: UserId, module_code: &str) -> AccessResult<AccessExplanation> {
        let Some(user) = self.users.find_user(user_id)? else {
            return Ok(AccessExplanation::user_not_found(module_code));
        };
        if let Some(explanation) = authorize::wildcard_explanation(&user.role, module_code) {
            return Ok(explanation);
        }
        let role = &user.role;
        let Some(level) = self.permissions.level_by_name(role.as_str())? else {
            return Ok(AccessExplanation::for_role(role, module_code, false, GrantSource::UnknownLevel));
        };
        let Some(module) = self.permissions.module_by_code(module_code)? else {
            return Ok(AccessExplanation::for_role(role, module_code, false, GrantSource::UnknownModule));
        };
        let (granted, source) = self.engine.matrix().grant_source(&level, &module)?;
        Ok(AccessExplanation::for_role(role, module_code, granted, source))
    }

    /// Fails unless `actor_id` strictly outranks `target_id`.
    pub fn ensure_can_manage(&self, actor_id: UserId, target_id: UserId) -> AccessResult<()> {
        let actor = self.load(actor_id)?;
        let target = self.load(target_id)?;
        ensure_can_manage(&actor.role, &target.role)?;
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.matrix().cache_stats()
    }

    pub fn worker_stats(&self) -> Option<WorkerStats> {
        self.engine.worker_stats()
    }

    /// Stop the background worker, if any.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn load(&self, user_id: UserId) -> AccessResult<UserRecord> {
        self.users
            .find_user(user_id)?
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")).into())
    }
}
