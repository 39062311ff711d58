//! Permission matrix evaluation and maintenance.

use std::sync::Arc;

use tracing::{debug, info};

use gestor_auth::{
    GrantSource, MatrixEntry, PermissionLevel, PermissionModule, default_grant,
};
use gestor_core::{DomainError, LevelId, ModuleId};
use gestor_infra::matrix_tasks::{
    BackgroundExecutor, BulkUpdatePayload, InlineExecutor, MatrixUpdateTask, TaskExecutor, TaskId,
    TaskKind, TaskResult, TaskRunner, TaskStatus, TaskStore, WorkerConfig, WorkerStats,
};
use gestor_infra::{CacheStats, DecisionCache, PermissionStore, StoreError};

use crate::config::{AccessConfig, ApplyMode};
use crate::error::AccessResult;

/// Reads and writes grant rows; owns the decision cache.
pub struct PermissionMatrix {
    store: Arc<dyn PermissionStore>,
    cache: DecisionCache,
}

impl PermissionMatrix {
    pub fn new(store: Arc<dyn PermissionStore>, cache: DecisionCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &dyn PermissionStore {
        self.store.as_ref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Whether `level_id` is granted `module_id`.
    ///
    /// A missing row is not an error: the rank default is persisted as an
    /// explicit row and returned. Unknown levels or modules are denied.
    pub fn is_granted(&self, level_id: LevelId, module_id: ModuleId) -> Result<bool, StoreError> {
        if let Some(granted) = self.cache.get(level_id, module_id) {
            return Ok(granted);
        }
        let seen = self.cache.generation();

        let granted = match self.store.entry(level_id, module_id)? {
            Some(entry) => entry.is_granted,
            None => {
                let (Some(level), Some(module)) = (self.store.level(level_id)?, self.store.module(module_id)?) else {
                    debug!(level_id = %level_id, module_id = %module_id, "unknown level or module; denied");
                    return Ok(false);
                };
                let stored = self.store.insert_entry_if_absent(MatrixEntry::default_for(&level, &module))?;
                debug!(level = %level.name, module = %module.code, granted = stored.is_granted, "default row persisted");
                stored.is_granted
            }
        };

        self.cache.fill(level_id, module_id, granted, seen);
        Ok(granted)
    }

    /// Read-only: the decision and where it comes from, without persisting
    /// defaults.
    pub fn grant_source(&self, level: &PermissionLevel, module: &PermissionModule) -> Result<(bool, GrantSource), StoreError> {
        Ok(match self.store.entry(level.id, module.id)? {
            Some(entry) => (entry.is_granted, GrantSource::MatrixRow),
            None => (default_grant(level.rank), GrantSource::RankDefault),
        })
    }

    /// `(code, granted)` for every module, defaults filled in, nothing written.
    pub fn level_grants(&self, level: &PermissionLevel) -> Result<Vec<(String, bool)>, StoreError> {
        let entries = self.store.entries_for_level(level.id)?;
        let modules = self.store.modules()?;
        Ok(modules
            .into_iter()
            .map(|module| {
                let granted = entries
                    .iter()
                    .find(|e| e.module_id == module.id)
                    .map(|e| e.is_granted)
                    .unwrap_or_else(|| default_grant(level.rank));
                (module.code, granted)
            })
            .collect())
    }

    /// Persist the rank default for every (level, module) pair lacking a row.
    /// Existing rows are never touched. Returns the number of rows inserted.
    pub fn ensure_defaults(&self) -> Result<usize, StoreError> {
        let levels = self.store.levels()?;
        let modules = self.store.modules()?;
        let mut inserted = 0;
        for level in &levels {
            for module in &modules {
                if self.store.entry(level.id, module.id)?.is_none() {
                    self.store.insert_entry_if_absent(MatrixEntry::default_for(level, module))?;
                    inserted += 1;
                }
            }
        }
        if inserted > 0 {
            info!(inserted, levels = levels.len(), modules = modules.len(), "default matrix rows seeded");
        }
        Ok(inserted)
    }

    /// Every (level, module) row, defaults materialized first.
    pub fn list_matrix(&self) -> Result<Vec<MatrixEntry>, StoreError> {
        self.ensure_defaults()?;
        self.store.entries()
    }

    /// Handler for [`TaskKind::BulkMatrixUpdate`].
    ///
    /// All entries are checked before the first write, so a malformed task
    /// writes nothing. The cache is invalidated once any row was written.
    pub fn apply_task(&self, task: &MatrixUpdateTask) -> TaskResult {
        let payload = match BulkUpdatePayload::from_value(&task.payload) {
            Ok(payload) => payload,
            Err(e) => return TaskResult::failure(format!("invalid payload: {e}")),
        };

        for entry in &payload.entries {
            if let Err(error) = self.check_entry(entry) {
                return TaskResult::failure(error);
            }
        }

        let mut applied = 0;
        for entry in payload.entries {
            if let Err(e) = self.store.upsert_entry(entry) {
                if applied > 0 {
                    self.cache.invalidate();
                }
                return TaskResult::Failure {
                    error: e.to_string(),
                    applied,
                };
            }
            applied += 1;
        }

        self.cache.invalidate();
        TaskResult::Success { applied }
    }

    fn check_entry(&self, entry: &MatrixEntry) -> Result<(), String> {
        match self.store.level(entry.level_id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(format!("unknown permission level: {}", entry.level_id)),
            Err(e) => return Err(e.to_string()),
        }
        match self.store.module(entry.module_id) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(format!("unknown permission module: {}", entry.module_id)),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// The matrix plus its update queue and the injected executor.
pub struct PermissionMatrixEngine {
    matrix: Arc<PermissionMatrix>,
    tasks: Arc<dyn TaskStore>,
    executor: Box<dyn TaskExecutor>,
}

impl PermissionMatrixEngine {
    pub fn new(matrix: Arc<PermissionMatrix>, tasks: Arc<dyn TaskStore>, config: &AccessConfig) -> AccessResult<Self> {
        let mut runner = TaskRunner::new(tasks.clone());
        let handler_matrix = matrix.clone();
        runner.register_handler(TaskKind::BulkMatrixUpdate, move |task| handler_matrix.apply_task(task));
        let runner = Arc::new(runner);

        let executor: Box<dyn TaskExecutor> = match config.apply_mode {
            ApplyMode::Inline => Box::new(InlineExecutor::new(runner)),
            ApplyMode::Background => Box::new(BackgroundExecutor::spawn(
                runner,
                WorkerConfig::default().with_poll_interval(config.worker_poll_interval),
            )?),
        };
        info!(apply_mode = ?config.apply_mode, "permission matrix engine ready");

        Ok(Self {
            matrix,
            tasks,
            executor,
        })
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn is_granted(&self, level_id: LevelId, module_id: ModuleId) -> AccessResult<bool> {
        Ok(self.matrix.is_granted(level_id, module_id)?)
    }

    pub fn list_matrix(&self) -> AccessResult<Vec<MatrixEntry>> {
        Ok(self.matrix.list_matrix()?)
    }

    /// Write the task record, then hand it to the executor.
    ///
    /// Inline mode returns after the task reached a terminal status; background
    /// mode returns while it is still pending.
    pub fn queue_bulk_update(&self, entries: Vec<MatrixEntry>) -> AccessResult<TaskId> {
        if entries.is_empty() {
            return Err(DomainError::validation("bulk update has no entries").into());
        }
        let count = entries.len();
        let task = MatrixUpdateTask::bulk_update(&BulkUpdatePayload::new(entries))?;
        let task_id = self.tasks.enqueue(task)?;
        info!(task_id = %task_id, entries = count, "matrix update queued");

        self.executor.submit(task_id)?;
        Ok(task_id)
    }

    pub fn task(&self, task_id: TaskId) -> AccessResult<Option<MatrixUpdateTask>> {
        Ok(self.tasks.get(task_id)?)
    }

    /// Tasks oldest first, optionally only those in `status`'s state.
    pub fn list_tasks(&self, status: Option<TaskStatus>, limit: usize) -> AccessResult<Vec<MatrixUpdateTask>> {
        Ok(self.tasks.list_by_status(status, limit)?)
    }

    pub fn worker_stats(&self) -> Option<WorkerStats> {
        self.executor.stats()
    }

    pub fn shutdown(&self) {
        self.executor.shutdown();
    }
}

impl Drop for PermissionMatrixEngine {
    fn drop(&mut self) {
        self.executor.shutdown();
    }
}
