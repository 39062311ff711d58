//! Bootstrap catalog: one permission level per role tier and the standard
//! module list. Safe to run on every start.

use serde::Serialize;
use tracing::info;

use gestor_auth::matrix::category_of;
use gestor_auth::{PermissionLevel, PermissionModule, TIERS};
use gestor_core::{LevelId, ModuleId};
use gestor_infra::{PermissionStore, StoreError};

/// `(code, display name)` of every standard module.
pub const STANDARD_MODULES: [(&str, &str); 25] = [
    ("dashboard", "Dashboard"),
    ("clock", "Time clock"),
    ("clock.manual_id", "Manual clock-in by ID"),
    ("daily_reports", "Daily reports"),
    ("time_records.view", "Time records"),
    ("sites.view", "Sites"),
    ("projects.view", "Projects"),
    ("projects.manage", "Manage projects"),
    ("projects.progress", "Project progress"),
    ("work_progress.view", "Work progress"),
    ("companies.view", "Companies"),
    ("companies.manage", "Manage companies"),
    ("team_composition", "Team composition"),
    ("employees.manage", "Manage employees"),
    ("gapo.view", "GAPO analysis"),
    ("costs.view", "Costs"),
    ("production.analytics", "Production analytics"),
    ("viewer_3d.view", "3D viewer"),
    ("users.manage", "Manage users"),
    ("custom_su.manage", "Custom service units"),
    ("audit_logs.view", "Audit logs"),
    ("db_hub.manage", "Database hub"),
    ("settings.profile", "Profile settings"),
    ("settings.mfa", "Two-factor authentication"),
    ("support.ticket", "Support tickets"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub levels: usize,
    pub modules: usize,
    pub defaults_inserted: usize,
}

/// Upsert the standard levels and modules. Existing rows keep their ids.
pub fn seed_standard_catalog(store: &dyn PermissionStore) -> Result<SeedReport, StoreError> {
    for tier in TIERS.iter() {
        store.upsert_level(PermissionLevel {
            id: LevelId::new(),
            name: tier.name.to_string(),
            rank: tier.rank,
            is_system: true,
        })?;
    }

    for (code, name) in STANDARD_MODULES {
        store.upsert_module(PermissionModule {
            id: ModuleId::new(),
            code: code.to_string(),
            name: name.to_string(),
            category: category_of(code).to_string(),
        })?;
    }

    let report = SeedReport {
        levels: TIERS.len(),
        modules: STANDARD_MODULES.len(),
        defaults_inserted: 0,
    };
    info!(levels = report.levels, modules = report.modules, "permission catalog seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gestor_infra::InMemoryPermissionStore;

    #[test]
    fn seeding_twice_is_idempotent() {
        let store = InMemoryPermissionStore::new();
        seed_standard_catalog(&store).unwrap();
        let first: Vec<_> = store.levels().unwrap().into_iter().map(|l| l.id).collect();

        seed_standard_catalog(&store).unwrap();
        let second: Vec<_> = store.levels().unwrap().into_iter().map(|l| l.id).collect();

        assert_eq!(first, second);
        assert_eq!(store.modules().unwrap().len(), STANDARD_MODULES.len());
    }

    #[test]
    fn module_codes_are_unique() {
        let mut codes: Vec<_> = STANDARD_MODULES.iter().map(|(c, _)| *c).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), STANDARD_MODULES.len());
    }

    #[test]
    fn categories_come_from_the_code() {
        let store = InMemoryPermissionStore::new();
        seed_standard_catalog(&store).unwrap();
        let module = store.module_by_code("clock.manual_id").unwrap().unwrap();
        assert_eq!(module.category, "clock");
    }
}
