//! Flattened `code -> granted` map handed to the UI.

use std::collections::BTreeMap;

use crate::capabilities::CapabilityResolver;
use crate::matrix::parent_code;
use crate::ranks::is_owner;
use crate::roles::Role;

/// Always granted to authenticated users.
pub const DASHBOARD: &str = "dashboard";

/// Marks accounts that regular administrators may not edit.
pub const PROTECTED_FLAG: &str = "system.is_protected";

/// Build a user's effective permissions.
///
/// Layers, later wins: matrix rows for the user's level, the role's flags,
/// the dashboard, the protection marker, then per-user overrides. Finally every
/// granted dotted code also grants its parent.
pub fn effective_permissions<'a, I>(
    role: &Role,
    matrix: I,
    overrides: &BTreeMap<String, bool>,
) -> BTreeMap<String, bool>
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut map: BTreeMap<String, bool> = matrix
        .into_iter()
        .map(|(code, granted)| (code.to_string(), granted))
        .collect();

    let resolver = CapabilityResolver::standard();
    let capabilities = resolver.resolve(role);
    for flag in capabilities.to_strings() {
        map.insert(flag, true);
    }

    map.insert(DASHBOARD.to_string(), true);

    if capabilities.is_omnipotent() || is_owner(role) {
        map.insert(PROTECTED_FLAG.to_string(), true);
    }

    for (code, granted) in overrides {
        map.insert(code.clone(), *granted);
    }

    let parents: Vec<String> = map
        .iter()
        .filter(|(_, granted)| **granted)
        .filter_map(|(code, _)| parent_code(code))
        .map(str::to_string)
        .collect();
    for parent in parents {
        map.insert(parent, true);
    }

    map
}
