use thiserror::Error;

use gestor_auth::AuthzError;
use gestor_core::DomainError;
use gestor_infra::StoreError;
use gestor_infra::matrix_tasks::TaskStoreError;

/// Application-layer error.
///
/// Denials are not errors; this covers broken collaborators and bad input.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tasks(#[from] TaskStoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("payload encoding failed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("executor unavailable: {0}")]
    Executor(#[from] std::io::Error),
}

pub type AccessResult<T> = Result<T, AccessError>;
