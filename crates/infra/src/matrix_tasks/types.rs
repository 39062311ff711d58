//! Matrix update task types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gestor_auth::MatrixEntry;

use super::store::TaskStoreError;

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task kind for routing to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Apply a batch of `(level, module, granted)` rows.
    BulkMatrixUpdate,
}

impl TaskKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            TaskKind::BulkMatrixUpdate => "bulk_matrix_update",
        }
    }
}

/// Task status. Transitions are one-way: `Pending` to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not applied yet
    Pending,
    /// Every entry landed
    Completed,
    /// Rejected or aborted; an administrator must re-submit
    Failed { error: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed { .. } => "failed",
        }
    }

    pub(crate) fn same_kind(&self, other: &TaskStatus) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Payload of a [`TaskKind::BulkMatrixUpdate`] task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdatePayload {
    pub entries: Vec<MatrixEntry>,
}

impl BulkUpdatePayload {
    pub fn new(entries: Vec<MatrixEntry>) -> Self {
        Self { entries }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// A queued matrix update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixUpdateTask {
    /// Unique task ID
    pub id: TaskId,
    /// Kind for routing
    pub kind: TaskKind,
    /// JSON payload
    pub payload: serde_json::Value,
    /// Current status
    pub status: TaskStatus,
    /// Number of rows written when the task finished
    pub applied: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatrixUpdateTask {
    pub fn new(kind: TaskKind, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            kind,
            payload,
            status: TaskStatus::Pending,
            applied: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bulk_update(payload: &BulkUpdatePayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(TaskKind::BulkMatrixUpdate, payload.to_value()?))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, TaskStatus::Pending)
    }

    /// Mark task as completed.
    pub fn mark_completed(&mut self, applied: usize) -> Result<(), TaskStoreError> {
        self.transition(TaskStatus::Completed)?;
        self.applied = applied;
        Ok(())
    }

    /// Mark task as failed. Terminal: there is no retry.
    pub fn mark_failed(&mut self, error: impl Into<String>, applied: usize) -> Result<(), TaskStoreError> {
        self.transition(TaskStatus::Failed { error: error.into() })?;
        self.applied = applied;
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<(), TaskStoreError> {
        if self.status.is_terminal() {
            return Err(TaskStoreError::InvalidTransition {
                id: self.id,
                from: self.status.name(),
                to: next.name(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Result of running a task handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// All entries applied
    Success { applied: usize },
    /// Aborted; `applied` rows were already written
    Failure { error: String, applied: usize },
}

impl TaskResult {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            applied: 0,
        }
    }

    pub fn applied(&self) -> usize {
        match self {
            TaskResult::Success { applied } | TaskResult::Failure { applied, .. } => *applied,
        }
    }
}
