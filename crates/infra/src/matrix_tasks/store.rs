//! Task queue storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::types::{MatrixUpdateTask, TaskId, TaskStatus};

/// Task queue abstraction. The queue is the source of truth for whether a
/// matrix change landed.
pub trait TaskStore: Send + Sync {
    /// Enqueue a new task.
    fn enqueue(&self, task: MatrixUpdateTask) -> Result<TaskId, TaskStoreError>;

    /// Get a task by ID.
    fn get(&self, task_id: TaskId) -> Result<Option<MatrixUpdateTask>, TaskStoreError>;

    /// Persist a task's new state.
    fn update(&self, task: &MatrixUpdateTask) -> Result<(), TaskStoreError>;

    /// Oldest pending task, if any.
    fn claim_next(&self) -> Result<Option<MatrixUpdateTask>, TaskStoreError>;

    /// List tasks, oldest first, optionally filtered by status kind.
    fn list_by_status(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> Result<Vec<MatrixUpdateTask>, TaskStoreError>;

    fn stats(&self) -> Result<TaskStats, TaskStoreError>;
}

impl<S> TaskStore for Arc<S>
where
    S: TaskStore + ?Sized,
{
    fn enqueue(&self, task: MatrixUpdateTask) -> Result<TaskId, TaskStoreError> {
        (**self).enqueue(task)
    }

    fn get(&self, task_id: TaskId) -> Result<Option<MatrixUpdateTask>, TaskStoreError> {
        (**self).get(task_id)
    }

    fn update(&self, task: &MatrixUpdateTask) -> Result<(), TaskStoreError> {
        (**self).update(task)
    }

    fn claim_next(&self) -> Result<Option<MatrixUpdateTask>, TaskStoreError> {
        (**self).claim_next()
    }

    fn list_by_status(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> Result<Vec<MatrixUpdateTask>, TaskStoreError> {
        (**self).list_by_status(status, limit)
    }

    fn stats(&self) -> Result<TaskStats, TaskStoreError> {
        (**self).stats()
    }
}

/// Task store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskStoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("task already exists: {0}")]
    AlreadyExists(TaskId),
    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: &'static str,
        to: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

/// Task statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TaskStats {
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

/// In-memory task store for tests/dev.
#[derive(Debug)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, MatrixUpdateTask>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn poisoned() -> TaskStoreError {
        TaskStoreError::Storage("task lock poisoned".to_string())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn enqueue(&self, task: MatrixUpdateTask) -> Result<TaskId, TaskStoreError> {
        let mut tasks = self.tasks.write().map_err(|_| Self::poisoned())?;
        if tasks.contains_key(&task.id) {
            return Err(TaskStoreError::AlreadyExists(task.id));
        }
        let id = task.id;
        tasks.insert(id, task);
        Ok(id)
    }

    fn get(&self, task_id: TaskId) -> Result<Option<MatrixUpdateTask>, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| Self::poisoned())?;
        Ok(tasks.get(&task_id).cloned())
    }

    fn update(&self, task: &MatrixUpdateTask) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().map_err(|_| Self::poisoned())?;
        let Some(current) = tasks.get(&task.id) else {
            return Err(TaskStoreError::NotFound(task.id));
        };
        // A stored terminal state is final.
        if current.status.is_terminal() && current.status != task.status {
            return Err(TaskStoreError::InvalidTransition {
                id: task.id,
                from: current.status.name(),
                to: task.status.name(),
            });
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    fn claim_next(&self) -> Result<Option<MatrixUpdateTask>, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| Self::poisoned())?;

        // Sort by created_at (then id) to ensure FIFO
        Ok(tasks
            .values()
            .filter(|t| t.is_pending())
            .min_by_key(|t| (t.created_at, t.id))
            .cloned())
    }

    fn list_by_status(
        &self,
        status: Option<TaskStatus>,
        limit: usize,
    ) -> Result<Vec<MatrixUpdateTask>, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| Self::poisoned())?;
        let mut result: Vec<_> = tasks
            .values()
            .filter(|t| status.as_ref().is_none_or(|s| t.status.same_kind(s)))
            .cloned()
            .collect();

        result.sort_by_key(|t| (t.created_at, t.id));
        result.truncate(limit);
        Ok(result)
    }

    fn stats(&self) -> Result<TaskStats, TaskStoreError> {
        let tasks = self.tasks.read().map_err(|_| Self::poisoned())?;
        let mut stats = TaskStats::default();
        for task in tasks.values() {
            match &task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Failed { .. } => stats.failed += 1,
            }
        }
        Ok(stats)
    }
}
