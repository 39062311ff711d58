use anyhow::Context;

use gestor_access::{AccessConfig, AccessControl, InMemoryCollaborators};

fn main() -> anyhow::Result<()> {
    gestor_observability::init();

    let config = AccessConfig::from_env();
    tracing::info!(apply_mode = ?config.apply_mode, cache = config.cache_enabled, "starting access engine");

    let stores = InMemoryCollaborators::new();
    let access = AccessControl::new(stores.collaborators(), &config).context("failed to build access engine")?;

    let report = access.bootstrap().context("failed to seed permission catalog")?;
    tracing::info!(
        levels = report.levels,
        modules = report.modules,
        defaults = report.defaults_inserted,
        "bootstrap complete"
    );

    let levels = stores_levels(&stores)?;
    let matrix = access.list_matrix().context("failed to list matrix")?;
    let output = serde_json::json!({
        "levels": levels,
        "matrix": matrix,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    access.shutdown();
    Ok(())
}

fn stores_levels(stores: &InMemoryCollaborators) -> anyhow::Result<Vec<gestor_auth::PermissionLevel>> {
    use gestor_infra::PermissionStore;
    Ok(stores.permissions.levels()?)
}
