//! `gestor-access`: authorization and context-scoping services.
//!
//! Wires the pure policy from `gestor-auth` to the repositories, task queue
//! and cache from `gestor-infra`. [`AccessControl`] is the only type route
//! handlers need.

pub mod config;
pub mod context_options;
pub mod context_validator;
pub mod error;
pub mod facade;
pub mod matrix_engine;
pub mod seed;

pub use config::{AccessConfig, ApplyMode};
pub use context_options::ContextOptionsResolver;
pub use context_validator::ContextValidator;
pub use error::{AccessError, AccessResult};
pub use facade::{AccessControl, Collaborators, InMemoryCollaborators};
pub use matrix_engine::{PermissionMatrix, PermissionMatrixEngine};
pub use seed::{STANDARD_MODULES, SeedReport, seed_standard_catalog};
