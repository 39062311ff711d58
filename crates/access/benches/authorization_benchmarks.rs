use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use gestor_access::{AccessConfig, AccessControl, InMemoryCollaborators};
use gestor_auth::{Affiliation, MatrixEntry, SelectionContext};
use gestor_core::{CompanyId, ProjectId, SiteId, UserId};
use gestor_infra::{PermissionStore, UserRecord};

fn setup(cache_enabled: bool) -> (InMemoryCollaborators, AccessControl) {
    let stores = InMemoryCollaborators::new();
    let config = AccessConfig::default().with_cache(cache_enabled);
    let access = AccessControl::new(stores.collaborators(), &config).unwrap();
    access.bootstrap().unwrap();
    (stores, access)
}

fn add_user(stores: &InMemoryCollaborators, role: &str, affiliation: Option<Affiliation>) -> UserId {
    stores.users.insert(UserRecord::new(role, affiliation)).unwrap()
}

fn bench_can(c: &mut Criterion) {
    let mut group = c.benchmark_group("can");

    for cache_enabled in [false, true] {
        let label = if cache_enabled { "cached" } else { "uncached" };
        group.bench_with_input(BenchmarkId::new("matrix_lookup", label), &cache_enabled, |b, &enabled| {
            let (stores, access) = setup(enabled);
            let viewer = add_user(&stores, "VIEWER", None);
            b.iter(|| access.can(black_box(viewer), black_box("costs.view")).unwrap());
        });
    }

    // Wildcard roles never reach the matrix
    group.bench_function("wildcard_short_circuit", |b| {
        let (stores, access) = setup(true);
        let admin = add_user(&stores, "ADMIN", None);
        b.iter(|| access.can(black_box(admin), black_box("costs.view")).unwrap());
    });

    group.finish();
}

fn bench_validate_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_context");
    let (company, project) = (CompanyId::new(), ProjectId::new());

    group.bench_function("site_manager_allowed", |b| {
        let (stores, access) = setup(true);
        let user = add_user(&stores, "SITE_MANAGER", Some(Affiliation::project(company, project)));
        let requested = SelectionContext::new()
            .with_company(company)
            .with_project(project)
            .with_site(SiteId::new());
        b.iter(|| access.validate_context(black_box(user), black_box(&requested)).unwrap());
    });

    group.bench_function("project_manager_denied", |b| {
        let (stores, access) = setup(true);
        let user = add_user(&stores, "PROJECT_MANAGER", Some(Affiliation::company(company)));
        let requested = SelectionContext::new().with_company(CompanyId::new());
        b.iter(|| access.validate_context(black_box(user), black_box(&requested)).unwrap());
    });

    group.finish();
}

fn bench_bulk_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_update_inline");

    for batch_size in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::new("entries", batch_size), &batch_size, |b, &size| {
            let (stores, access) = setup(true);
            let levels = stores.permissions.levels().unwrap();
            let modules = stores.permissions.modules().unwrap();
            let entries: Vec<MatrixEntry> = levels
                .iter()
                .flat_map(|l| modules.iter().map(move |m| MatrixEntry::new(l.id, m.id, true)))
                .take(size)
                .collect();
            b.iter(|| access.queue_bulk_update(black_box(entries.clone())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_can, bench_validate_context, bench_bulk_update);
criterion_main!(benches);
