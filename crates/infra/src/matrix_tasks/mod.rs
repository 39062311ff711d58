//! Queued permission-matrix updates.
//!
//! ## Design
//!
//! - Administrative edits are written to the queue first; the queue is the
//!   record of whether a change landed
//! - Status moves one way, `pending` to `completed` or `failed`; no retry
//! - Each entry is applied as an idempotent upsert keyed by (level, module),
//!   so overlapping tasks are last-write-wins
//! - The executor is injected: inline for single-process deployments, a
//!   polling worker thread otherwise

pub mod executor;
pub mod store;
pub mod types;

pub use executor::{
    BackgroundExecutor, InlineExecutor, TaskExecutor, TaskHandler, TaskRunner, WorkerConfig,
    WorkerHandle, WorkerStats, spawn_worker,
};
pub use store::{InMemoryTaskStore, TaskStats, TaskStore, TaskStoreError};
pub use types::{BulkUpdatePayload, MatrixUpdateTask, TaskId, TaskKind, TaskResult, TaskStatus};
