#![allow(dead_code)]

use std::time::{Duration, Instant};

use gestor_access::{AccessConfig, AccessControl, InMemoryCollaborators};
use gestor_auth::{Affiliation, PermissionLevel, PermissionModule};
use gestor_core::UserId;
use gestor_infra::{PermissionStore, UserRecord};

pub struct Harness {
    pub stores: InMemoryCollaborators,
    pub access: AccessControl,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AccessConfig::default())
    }

    pub fn with_config(config: AccessConfig) -> Self {
        let stores = InMemoryCollaborators::new();
        let access = AccessControl::new(stores.collaborators(), &config).unwrap();
        access.bootstrap().unwrap();
        Self { stores, access }
    }

    pub fn add_user(&self, role: &str, affiliation: Option<Affiliation>) -> UserId {
        self.insert(UserRecord::new(role, affiliation))
    }

    pub fn insert(&self, user: UserRecord) -> UserId {
        self.stores.users.insert(user).unwrap()
    }

    pub fn level(&self, name: &str) -> PermissionLevel {
        self.stores.permissions.level_by_name(name).unwrap().unwrap()
    }

    pub fn module(&self, code: &str) -> PermissionModule {
        self.stores.permissions.module_by_code(code).unwrap().unwrap()
    }
}

pub fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
