//! Validates the operating context a request claims.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use gestor_auth::{
    ContextDecision, ContextValidation, DenialReason, ScopeSubject, SelectionContext, evaluate,
};
use gestor_core::UserId;
use gestor_infra::{AuditAction, AuditEvent, AuditSink, UserDirectory, UserRecord};

use crate::error::AccessResult;

/// Entity name recorded on security validation audit events.
pub const AUDIT_ENTITY: &str = "SecurityValidation";

pub struct ContextValidator {
    users: Arc<dyn UserDirectory>,
    audit: Arc<dyn AuditSink>,
}

impl ContextValidator {
    pub fn new(users: Arc<dyn UserDirectory>, audit: Arc<dyn AuditSink>) -> Self {
        Self { users, audit }
    }

    /// Decide whether `user_id` may operate in `requested`.
    ///
    /// Denials come back as `Ok` with `valid == false`. Blocked attempts write
    /// exactly one audit event first; if that write fails the error
    /// propagates instead of a silent deny.
    pub fn validate(&self, user_id: UserId, requested: &SelectionContext) -> AccessResult<ContextValidation> {
        let Some(user) = self.users.find_user(user_id)? else {
            warn!(user_id = %user_id, "context denied: user not found");
            return Ok(ContextValidation::denied(DenialReason::UserNotFound));
        };
        self.validate_user(&user, requested)
    }

    pub fn validate_user(&self, user: &UserRecord, requested: &SelectionContext) -> AccessResult<ContextValidation> {
        let subject = ScopeSubject {
            role: &user.role,
            affiliation: user.affiliation.as_ref(),
            allowed_projects: user.allowed_projects.as_deref(),
        };
        let decision = evaluate(subject, requested);

        match decision {
            ContextDecision::Allow => {
                debug!(user_id = %user.id, role = %user.role, "context allowed");
            }
            ContextDecision::Deny(reason) => {
                warn!(
                    user_id = %user.id,
                    role = %user.role,
                    reason = reason.code(),
                    "context denied"
                );
            }
            ContextDecision::Blocked(reason) => {
                warn!(
                    user_id = %user.id,
                    role = %user.role,
                    reason = reason.code(),
                    "context blocked: account has no linked context"
                );
                self.record_blocked(user, reason)?;
            }
        }

        Ok(decision.into())
    }

    fn record_blocked(&self, user: &UserRecord, reason: DenialReason) -> AccessResult<()> {
        let event = AuditEvent::new(AuditAction::LoginBlockedNoContext, AUDIT_ENTITY, user.id).with_details(json!({
            "role": user.role.as_str(),
            "message": reason.message(),
        }));
        self.audit.record(event)?;
        Ok(())
    }
}
