//! Security audit events emitted by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gestor_core::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A fixed-scope account with no linked company tried to pick a context.
    LoginBlockedNoContext,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginBlockedNoContext => "LOGIN_BLOCKED_NO_CONTEXT",
        }
    }
}

impl core::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: AuditAction,
    pub entity: String,
    pub user_id: UserId,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, entity: impl Into<String>, user_id: UserId) -> Self {
        Self {
            id: Uuid::now_v7(),
            action,
            entity: entity.into(),
            user_id,
            details: serde_json::Value::Null,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_to_its_code() {
        let event = AuditEvent::new(AuditAction::LoginBlockedNoContext, "SecurityValidation", UserId::new())
            .with_details(serde_json::json!({ "role": "OPERATIONAL" }));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["action"], "LOGIN_BLOCKED_NO_CONTEXT");
        assert_eq!(json["details"]["role"], "OPERATIONAL");
        assert_eq!(AuditAction::LoginBlockedNoContext.to_string(), "LOGIN_BLOCKED_NO_CONTEXT");
    }
}
