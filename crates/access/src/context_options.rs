//! Computes the contexts a user may switch into.

use std::sync::Arc;

use tracing::debug;

use gestor_auth::{ContextOptions, OptionsScope, options_scope};
use gestor_core::UserId;
use gestor_infra::{ContextCatalog, UserDirectory, UserRecord};

use crate::error::AccessResult;

pub struct ContextOptionsResolver {
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn ContextCatalog>,
}

impl ContextOptionsResolver {
    pub fn new(users: Arc<dyn UserDirectory>, catalog: Arc<dyn ContextCatalog>) -> Self {
        Self { users, catalog }
    }

    /// Unknown users get an all-`None` fixed result, never an error.
    pub fn options(&self, user_id: UserId) -> AccessResult<ContextOptions> {
        match self.users.find_user(user_id)? {
            Some(user) => self.options_for(&user),
            None => {
                debug!(user_id = %user_id, "no such user; no usable context");
                Ok(ContextOptions::fixed(None))
            }
        }
    }

    /// Fixed-scope users never touch the catalog.
    pub fn options_for(&self, user: &UserRecord) -> AccessResult<ContextOptions> {
        match options_scope(&user.role) {
            OptionsScope::Global => {
                let options = ContextOptions::Global {
                    companies: self.catalog.companies()?,
                    projects: self.catalog.projects()?,
                    sites: self.catalog.sites()?,
                };
                debug!(user_id = %user.id, role = %user.role, "global context options");
                Ok(options)
            }
            OptionsScope::Fixed => Ok(ContextOptions::fixed(user.affiliation.as_ref())),
        }
    }
}
