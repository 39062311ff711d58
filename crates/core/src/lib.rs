//! `gestor-core`: identifiers and the domain error model shared by every
//! layer of the access engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, LevelId, ModuleId, ProjectId, SiteId, UserId};
