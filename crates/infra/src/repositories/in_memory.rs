//! In-memory repositories for tests/dev.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use gestor_auth::{
    CompanySummary, MatrixEntry, PermissionLevel, PermissionModule, ProjectSummary, SiteSummary,
};
use gestor_core::{LevelId, ModuleId, UserId};

use super::{AuditSink, ContextCatalog, PermissionStore, StoreError, UserDirectory, UserRecord};
use crate::audit::AuditEvent;

fn read<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read().map_err(|_| StoreError::poisoned(what))
}

fn write<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::poisoned(what))
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) -> Result<UserId, StoreError> {
        let id = user.id;
        write(&self.users, "users")?.insert(id, user);
        Ok(id)
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_user(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(read(&self.users, "users")?.get(&user_id).cloned())
    }
}

/// Catalog that counts how often it was queried.
#[derive(Debug, Default)]
pub struct InMemoryContextCatalog {
    companies: RwLock<Vec<CompanySummary>>,
    projects: RwLock<Vec<ProjectSummary>>,
    sites: RwLock<Vec<SiteSummary>>,
    queries: AtomicUsize,
}

impl InMemoryContextCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_company(&self, company: CompanySummary) -> Result<(), StoreError> {
        write(&self.companies, "companies")?.push(company);
        Ok(())
    }

    pub fn add_project(&self, project: ProjectSummary) -> Result<(), StoreError> {
        write(&self.projects, "projects")?.push(project);
        Ok(())
    }

    pub fn add_site(&self, site: SiteSummary) -> Result<(), StoreError> {
        write(&self.sites, "sites")?.push(site);
        Ok(())
    }

    /// Number of catalog reads served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl ContextCatalog for InMemoryContextCatalog {
    fn companies(&self) -> Result<Vec<CompanySummary>, StoreError> {
        self.hit();
        Ok(read(&self.companies, "companies")?.clone())
    }

    fn projects(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        self.hit();
        Ok(read(&self.projects, "projects")?.clone())
    }

    fn sites(&self) -> Result<Vec<SiteSummary>, StoreError> {
        self.hit();
        Ok(read(&self.sites, "sites")?.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    levels: RwLock<HashMap<LevelId, PermissionLevel>>,
    modules: RwLock<HashMap<ModuleId, PermissionModule>>,
    entries: RwLock<HashMap<(LevelId, ModuleId), MatrixEntry>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionStore for InMemoryPermissionStore {
    fn level(&self, level_id: LevelId) -> Result<Option<PermissionLevel>, StoreError> {
        Ok(read(&self.levels, "levels")?.get(&level_id).cloned())
    }

    fn level_by_name(&self, name: &str) -> Result<Option<PermissionLevel>, StoreError> {
        let levels = read(&self.levels, "levels")?;
        Ok(levels
            .values()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    fn module(&self, module_id: ModuleId) -> Result<Option<PermissionModule>, StoreError> {
        Ok(read(&self.modules, "modules")?.get(&module_id).cloned())
    }

    fn module_by_code(&self, code: &str) -> Result<Option<PermissionModule>, StoreError> {
        let modules = read(&self.modules, "modules")?;
        Ok(modules.values().find(|m| m.code == code).cloned())
    }

    fn levels(&self) -> Result<Vec<PermissionLevel>, StoreError> {
        let mut levels: Vec<_> = read(&self.levels, "levels")?.values().cloned().collect();
        levels.sort_by(|a, b| b.rank.cmp(&a.rank).then_with(|| a.name.cmp(&b.name)));
        Ok(levels)
    }

    fn modules(&self) -> Result<Vec<PermissionModule>, StoreError> {
        let mut modules: Vec<_> = read(&self.modules, "modules")?.values().cloned().collect();
        modules.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(modules)
    }

    fn entry(&self, level_id: LevelId, module_id: ModuleId) -> Result<Option<MatrixEntry>, StoreError> {
        Ok(read(&self.entries, "entries")?.get(&(level_id, module_id)).copied())
    }

    fn entries(&self) -> Result<Vec<MatrixEntry>, StoreError> {
        let mut entries: Vec<_> = read(&self.entries, "entries")?.values().copied().collect();
        entries.sort_by_key(|e| e.key());
        Ok(entries)
    }

    fn entries_for_level(&self, level_id: LevelId) -> Result<Vec<MatrixEntry>, StoreError> {
        let mut entries: Vec<_> = read(&self.entries, "entries")?
            .values()
            .filter(|e| e.level_id == level_id)
            .copied()
            .collect();
        entries.sort_by_key(|e| e.module_id);
        Ok(entries)
    }

    fn upsert_entry(&self, entry: MatrixEntry) -> Result<(), StoreError> {
        write(&self.entries, "entries")?.insert(entry.key(), entry);
        Ok(())
    }

    fn insert_entry_if_absent(&self, entry: MatrixEntry) -> Result<MatrixEntry, StoreError> {
        let mut entries = write(&self.entries, "entries")?;
        Ok(*entries.entry(entry.key()).or_insert(entry))
    }

    fn upsert_level(&self, mut level: PermissionLevel) -> Result<PermissionLevel, StoreError> {
        let mut levels = write(&self.levels, "levels")?;
        let existing = levels
            .values()
            .find(|l| l.name.eq_ignore_ascii_case(&level.name))
            .map(|l| l.id);
        if let Some(id) = existing {
            level.id = id;
        }
        levels.insert(level.id, level.clone());
        Ok(level)
    }

    fn upsert_module(&self, mut module: PermissionModule) -> Result<PermissionModule, StoreError> {
        let mut modules = write(&self.modules, "modules")?;
        let existing = modules.values().find(|m| m.code == module.code).map(|m| m.id);
        if let Some(id) = existing {
            module.id = id;
        }
        modules.insert(module.id, module.clone());
        Ok(module)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), StoreError> {
        write(&self.events, "audit")?.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestor_auth::{Rank, Role};
    use gestor_core::CompanyId;

    fn level(name: &str, rank: u32) -> PermissionLevel {
        PermissionLevel {
            id: LevelId::new(),
            name: name.to_string(),
            rank: Rank::new(rank),
            is_system: true,
        }
    }

    fn module(code: &str) -> PermissionModule {
        PermissionModule {
            id: ModuleId::new(),
            code: code.to_string(),
            name: code.to_string(),
            category: "test".to_string(),
        }
    }

    #[test]
    fn upserting_a_level_keeps_its_id() {
        let store = InMemoryPermissionStore::new();
        let first = store.upsert_level(level("ADMIN", 1500)).unwrap();
        let second = store.upsert_level(level("admin", 1600)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.levels().unwrap().len(), 1);
        assert_eq!(store.level_by_name("Admin").unwrap().unwrap().rank, Rank::new(1600));
    }

    #[test]
    fn insert_if_absent_never_overwrites() {
        let store = InMemoryPermissionStore::new();
        let lvl = store.upsert_level(level("VIEWER", 50)).unwrap();
        let m = store.upsert_module(module("costs.view")).unwrap();

        store.upsert_entry(MatrixEntry::new(lvl.id, m.id, true)).unwrap();
        let stored = store
            .insert_entry_if_absent(MatrixEntry::new(lvl.id, m.id, false))
            .unwrap();

        assert!(stored.is_granted);
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn levels_are_listed_highest_rank_first() {
        let store = InMemoryPermissionStore::new();
        store.upsert_level(level("GUEST", 10)).unwrap();
        store.upsert_level(level("HELPER_SYSTEM", 2000)).unwrap();
        store.upsert_level(level("SUPERVISOR", 600)).unwrap();

        let names: Vec<_> = store.levels().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["HELPER_SYSTEM", "SUPERVISOR", "GUEST"]);
    }

    #[test]
    fn catalog_counts_queries() {
        let catalog = InMemoryContextCatalog::new();
        catalog
            .add_company(CompanySummary {
                id: CompanyId::new(),
                name: "Acme".to_string(),
            })
            .unwrap();

        assert_eq!(catalog.query_count(), 0);
        assert_eq!(catalog.companies().unwrap().len(), 1);
        catalog.sites().unwrap();
        assert_eq!(catalog.query_count(), 2);
    }

    #[test]
    fn users_round_trip_through_the_directory() {
        let directory = InMemoryUserDirectory::new();
        let id = directory.insert(UserRecord::new("worker", None)).unwrap();

        let user = directory.find_user(id).unwrap().unwrap();
        assert_eq!(user.role, Role::Operational);
        assert!(directory.find_user(UserId::new()).unwrap().is_none());
    }
}
