//! Permission matrix model and default-grant policy.

use serde::{Deserialize, Serialize};

use gestor_core::{LevelId, ModuleId};

use crate::ranks::{DEFAULT_GRANT_RANK, Rank};

/// One row per role tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionLevel {
    pub id: LevelId,
    pub name: String,
    pub rank: Rank,
    pub is_system: bool,
}

/// One row per feature/action surface (e.g. `users.manage`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionModule {
    pub id: ModuleId,
    pub code: String,
    pub name: String,
    pub category: String,
}

/// Explicit grant for a (level, module) pair. Unique on the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixEntry {
    pub level_id: LevelId,
    pub module_id: ModuleId,
    pub is_granted: bool,
}

impl MatrixEntry {
    pub fn new(level_id: LevelId, module_id: ModuleId, is_granted: bool) -> Self {
        Self {
            level_id,
            module_id,
            is_granted,
        }
    }

    pub fn key(&self) -> (LevelId, ModuleId) {
        (self.level_id, self.module_id)
    }

    /// The row a pair gets when nobody has edited it yet.
    pub fn default_for(level: &PermissionLevel, module: &PermissionModule) -> Self {
        Self::new(level.id, module.id, default_grant(level.rank))
    }
}

/// Rank-based default: full access at or above [`DEFAULT_GRANT_RANK`].
pub fn default_grant(rank: Rank) -> bool {
    rank >= DEFAULT_GRANT_RANK
}

/// `users.manage` -> `users`. `None` for undotted codes.
pub fn parent_code(code: &str) -> Option<&str> {
    code.rsplit_once('.').map(|(parent, _)| parent).filter(|p| !p.is_empty())
}

/// Category a module belongs to: its leading code segment.
pub fn category_of(code: &str) -> &str {
    code.split('.').next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(rank: u32) -> PermissionLevel {
        PermissionLevel {
            id: LevelId::new(),
            name: format!("L{rank}"),
            rank: Rank::new(rank),
            is_system: true,
        }
    }

    fn module(code: &str) -> PermissionModule {
        PermissionModule {
            id: ModuleId::new(),
            code: code.to_string(),
            name: code.to_string(),
            category: category_of(code).to_string(),
        }
    }

    #[test]
    fn default_grant_follows_rank_threshold() {
        assert!(default_grant(Rank::new(2000)));
        assert!(default_grant(Rank::new(1500)));
        assert!(!default_grant(Rank::new(1200)));
        assert!(!default_grant(Rank::new(100)));
        assert!(!default_grant(Rank::ZERO));
    }

    #[test]
    fn default_entry_uses_level_and_module_ids() {
        let (lvl, m) = (level(2000), module("users.manage"));
        let entry = MatrixEntry::default_for(&lvl, &m);
        assert_eq!(entry.key(), (lvl.id, m.id));
        assert!(entry.is_granted);
        assert!(!MatrixEntry::default_for(&level(100), &m).is_granted);
    }

    #[test]
    fn parent_code_strips_last_segment() {
        assert_eq!(parent_code("users.manage"), Some("users"));
        assert_eq!(parent_code("clock.manual_id"), Some("clock"));
        assert_eq!(parent_code("a.b.c"), Some("a.b"));
        assert_eq!(parent_code("dashboard"), None);
        assert_eq!(parent_code(".x"), None);
    }

    #[test]
    fn entries_serialize_camel_case() {
        let entry = MatrixEntry::new(LevelId::new(), ModuleId::new(), false);
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["isGranted"], false);
        assert!(json.get("levelId").is_some());
    }
}
