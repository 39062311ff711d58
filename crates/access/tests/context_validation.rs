mod common;

use std::sync::Arc;

use common::Harness;
use gestor_access::{AccessConfig, AccessControl, AccessError, Collaborators, InMemoryCollaborators};
use gestor_auth::{Affiliation, DenialReason, SelectionContext};
use gestor_core::{CompanyId, ProjectId, SiteId, UserId};
use gestor_infra::{AuditAction, AuditEvent, AuditSink, StoreError, UserRecord};

#[test]
fn site_manager_stays_inside_own_project() {
    let h = Harness::new();
    let (c1, p1) = (CompanyId::new(), ProjectId::new());
    let user = h.add_user("SITE_MANAGER", Some(Affiliation::project(c1, p1)));

    let inside = SelectionContext::new()
        .with_company(c1)
        .with_project(p1)
        .with_site(SiteId::new());
    assert!(h.access.validate_context(user, &inside).unwrap().valid);

    let elsewhere = SelectionContext::new().with_company(c1).with_project(ProjectId::new());
    let result = h.access.validate_context(user, &elsewhere).unwrap();
    assert!(!result.valid);
    let reason = result.reason.unwrap();
    assert_eq!(reason, DenialReason::ProjectBoundary);
    assert!(reason.message().contains("within your registered project"));
}

#[test]
fn site_manager_request_is_judged_as_a_whole() {
    let h = Harness::new();
    let (c1, p1) = (CompanyId::new(), ProjectId::new());
    let user = h.add_user("gestor_canteiro", Some(Affiliation::project(c1, p1)));

    let with_site = SelectionContext::new()
        .with_company(c1)
        .with_project(ProjectId::new())
        .with_site(SiteId::new());
    let result = h.access.validate_context(user, &with_site).unwrap();
    assert_eq!(result.reason, Some(DenialReason::ProjectBoundary));
}

#[test]
fn project_manager_without_project_gets_project_required() {
    let h = Harness::new();
    let c1 = CompanyId::new();
    let user = h.add_user("PROJECT_MANAGER", Some(Affiliation::company(c1)));

    let result = h
        .access
        .validate_context(user, &SelectionContext::new().with_company(c1))
        .unwrap();

    assert!(!result.valid);
    let reason = result.reason.unwrap();
    assert_eq!(reason.code(), "project_required");
    assert_ne!(reason.message(), DenialReason::UserNotFound.message());
    assert!(h.stores.audit.events().is_empty());
}

#[test]
fn project_manager_allow_list_is_enforced() {
    let h = Harness::new();
    let (c1, p1) = (CompanyId::new(), ProjectId::new());
    let user = h.insert(
        UserRecord::new("PROJECT_MANAGER", Some(Affiliation::company(c1))).with_allowed_projects(vec![p1]),
    );

    let ok = SelectionContext::new().with_company(c1).with_project(p1);
    assert!(h.access.validate_context(user, &ok).unwrap().valid);

    let other = SelectionContext::new().with_company(c1).with_project(ProjectId::new());
    assert_eq!(
        h.access.validate_context(user, &other).unwrap().reason,
        Some(DenialReason::ProjectNotPermitted)
    );
}

#[test]
fn worker_without_affiliation_is_blocked_and_audited_once() {
    let h = Harness::new();
    let user = h.add_user("OPERATIONAL", None);

    let result = h.access.validate_context(user, &SelectionContext::new()).unwrap();
    assert!(!result.valid);
    assert_eq!(result.reason, Some(DenialReason::NoLinkedContext));

    let events = h.stores.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::LoginBlockedNoContext);
    assert_eq!(events[0].user_id, user);
    assert_eq!(events[0].entity, "SecurityValidation");
    assert_eq!(events[0].details["role"], "OPERATIONAL");

    // One event per denied attempt.
    h.access.validate_context(user, &SelectionContext::new()).unwrap();
    assert_eq!(h.stores.audit.events().len(), 2);
}

#[test]
fn worker_with_company_only_is_blocked_and_audited() {
    let h = Harness::new();
    let user = h.add_user("OPERATIONAL", Some(Affiliation::company(CompanyId::new())));

    let result = h.access.validate_context(user, &SelectionContext::new()).unwrap();

    assert!(!result.valid);
    assert_eq!(result.reason, Some(DenialReason::NoLinkedContext));
    let events = h.stores.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::LoginBlockedNoContext);
}

#[test]
fn fixed_user_without_site_is_blocked() {
    let h = Harness::new();
    let user = h.add_user("VIEWER", Some(Affiliation::project(CompanyId::new(), ProjectId::new())));

    let result = h.access.validate_context(user, &SelectionContext::new()).unwrap();

    assert_eq!(result.reason, Some(DenialReason::NoLinkedContext));
    assert_eq!(h.stores.audit.events().len(), 1);
}

#[test]
fn legacy_global_management_roles_pass_any_context() {
    let h = Harness::new();
    let anywhere = SelectionContext::new()
        .with_company(CompanyId::new())
        .with_project(ProjectId::new());

    for role in ["SOCIO_DIRETOR", "MANAGER", "MODERATOR"] {
        let user = h.add_user(role, None);
        let result = h.access.validate_context(user, &anywhere).unwrap();
        assert!(result.valid, "{role}: {:?}", result.reason);
    }
    assert!(h.stores.audit.events().is_empty());
}

#[test]
fn worker_with_affiliation_is_locked_to_it() {
    let h = Harness::new();
    let aff = Affiliation::site(CompanyId::new(), ProjectId::new(), SiteId::new());
    let user = h.add_user("WORKER", Some(aff.clone()));

    let own = SelectionContext {
        company_id: aff.company_id,
        project_id: aff.project_id,
        site_id: aff.site_id,
    };
    assert!(h.access.validate_context(user, &own).unwrap().valid);

    let other_project = SelectionContext::new().with_project(ProjectId::new());
    assert_eq!(
        h.access.validate_context(user, &other_project).unwrap().reason,
        Some(DenialReason::ProjectContextInvalid)
    );
    assert!(h.stores.audit.events().is_empty());
}

#[test]
fn god_roles_pass_any_context() {
    let h = Harness::new();
    let user = h.add_user("HELPER_SYSTEM", None);
    let anywhere = SelectionContext::new()
        .with_company(CompanyId::new())
        .with_project(ProjectId::new());
    assert!(h.access.validate_context(user, &anywhere).unwrap().valid);
}

#[test]
fn unknown_user_is_denied_not_an_error() {
    let h = Harness::new();
    let result = h.access.validate_context(UserId::new(), &SelectionContext::new()).unwrap();
    assert_eq!(result.reason, Some(DenialReason::UserNotFound));
    assert!(h.stores.audit.events().is_empty());
}

struct BrokenAuditSink;

impl AuditSink for BrokenAuditSink {
    fn record(&self, _event: AuditEvent) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("audit log offline".to_string()))
    }
}

#[test]
fn audit_failure_propagates_instead_of_silent_deny() {
    let stores = InMemoryCollaborators::new();
    let collaborators = Collaborators {
        audit: Arc::new(BrokenAuditSink),
        ..stores.collaborators()
    };
    let access = AccessControl::new(collaborators, &AccessConfig::default()).unwrap();
    let user = stores.users.insert(UserRecord::new("VIEWER", None)).unwrap();

    let err = access.validate_context(user, &SelectionContext::new()).unwrap_err();
    assert!(matches!(err, AccessError::Store(StoreError::Unavailable(_))));
}
