//! Infrastructure layer: repositories, the matrix task queue, caching.

pub mod audit;
pub mod cache;
pub mod matrix_tasks;
pub mod repositories;

pub use audit::{AuditAction, AuditEvent};
pub use cache::{CacheStats, DecisionCache, Generation};
pub use repositories::{
    AuditSink, ContextCatalog, InMemoryAuditSink, InMemoryContextCatalog, InMemoryPermissionStore,
    InMemoryUserDirectory, PermissionStore, StoreError, UserDirectory, UserRecord,
};
