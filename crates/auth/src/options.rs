//! Selectable operating contexts.

use serde::{Deserialize, Serialize};

use gestor_core::{CompanyId, ProjectId, SiteId};

use crate::capabilities::CapabilityResolver;
use crate::context::Affiliation;
use crate::ranks::is_global_management;
use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub company_id: CompanyId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub id: SiteId,
    pub name: String,
    pub project_id: ProjectId,
}

/// What the context switcher may offer a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextOptions {
    /// Free selection over the full catalog.
    #[serde(rename_all = "camelCase")]
    Global {
        companies: Vec<CompanySummary>,
        projects: Vec<ProjectSummary>,
        sites: Vec<SiteSummary>,
    },
    /// Locked to the user's own affiliation. All `None` means no usable context.
    #[serde(rename_all = "camelCase")]
    Fixed {
        company_id: Option<CompanyId>,
        project_id: Option<ProjectId>,
        site_id: Option<SiteId>,
    },
}

impl ContextOptions {
    pub fn fixed(affiliation: Option<&Affiliation>) -> Self {
        let affiliation = affiliation.cloned().unwrap_or_default();
        ContextOptions::Fixed {
            company_id: affiliation.company_id,
            project_id: affiliation.project_id,
            site_id: affiliation.site_id,
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, ContextOptions::Global { .. })
    }

    /// `true` for a fixed result that names nothing.
    pub fn is_unusable(&self) -> bool {
        matches!(
            self,
            ContextOptions::Fixed {
                company_id: None,
                project_id: None,
                site_id: None,
            }
        )
    }
}

/// Which kind of options a role gets, decided before any catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsScope {
    Global,
    Fixed,
}

pub fn options_scope(role: &Role) -> OptionsScope {
    if CapabilityResolver::standard().has_wildcard(role) || is_global_management(role) {
        OptionsScope::Global
    } else {
        OptionsScope::Fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_roles_get_the_catalog() {
        assert_eq!(options_scope(&Role::HelperSystem), OptionsScope::Global);
        assert_eq!(options_scope(&Role::TiSoftware), OptionsScope::Global);
        assert_eq!(options_scope(&Role::CompanyAdmin), OptionsScope::Fixed);
        assert_eq!(options_scope(&Role::parse("nobody")), OptionsScope::Fixed);
    }

    #[test]
    fn fixed_without_affiliation_is_unusable() {
        let options = ContextOptions::fixed(None);
        assert!(options.is_unusable());
        assert!(!options.is_global());
    }

    #[test]
    fn wire_shape_is_tagged() {
        let company_id = CompanyId::new();
        let options = ContextOptions::fixed(Some(&Affiliation::company(company_id)));
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["type"], "FIXED");
        assert_eq!(json["companyId"], company_id.to_string());
        assert!(json["siteId"].is_null());

        let global = ContextOptions::Global {
            companies: vec![],
            projects: vec![],
            sites: vec![],
        };
        assert_eq!(serde_json::to_value(&global).unwrap()["type"], "GLOBAL");
    }
}
