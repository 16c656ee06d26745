//! Permission registry and evaluation.
//!
//! The registry is a closed set: every grantable capability is a variant of
//! [`Permission`]. Wire input (string keys) is checked against it with
//! [`validate_keys`] / [`parse_permission_update`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// A grantable capability for regular users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewCases,
    CreateCase,
    CommentOnCases,
    EditOwnCases,
    AssignToSelf,
    WatchCase,
    ProfileManagement,
}

impl Permission {
    /// Every permission in the registry, in display order.
    pub const ALL: [Permission; 7] = [
        Permission::ViewCases,
        Permission::CreateCase,
        Permission::CommentOnCases,
        Permission::EditOwnCases,
        Permission::AssignToSelf,
        Permission::WatchCase,
        Permission::ProfileManagement,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Permission::ViewCases => "view_cases",
            Permission::CreateCase => "create_case",
            Permission::CommentOnCases => "comment_on_cases",
            Permission::EditOwnCases => "edit_own_cases",
            Permission::AssignToSelf => "assign_to_self",
            Permission::WatchCase => "watch_case",
            Permission::ProfileManagement => "profile_management",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Permission::ViewCases => "View Cases",
            Permission::CreateCase => "Create Case",
            Permission::CommentOnCases => "Comment on Cases",
            Permission::EditOwnCases => "Edit Own Cases",
            Permission::AssignToSelf => "Assign to Self (Take Task)",
            Permission::WatchCase => "Watch / Follow a Case",
            Permission::ProfileManagement => "Profile Management",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Permission::ViewCases => {
                "Read-only access to cases: browse the list, open details, read comments and the activity timeline."
            }
            Permission::CreateCase => {
                "Create new cases with a title and description. Priority, assignment and due date stay with admins."
            }
            Permission::CommentOnCases => {
                "Add comments to cases and edit or delete your own comments."
            }
            Permission::EditOwnCases => {
                "Edit the title and description of cases you created."
            }
            Permission::AssignToSelf => {
                "Take an unassigned case. Cannot assign others or reassign taken cases."
            }
            Permission::WatchCase => {
                "Follow a case to track its updates without taking responsibility for it."
            }
            Permission::ProfileManagement => "Update your own display name.",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-user permission flags. Unset keys evaluate to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<Permission, bool>);

impl PermissionMap {
    /// Empty map (stored for admins, whose role bypasses the map).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every registry key explicitly set to `false`.
    pub fn defaults() -> Self {
        Self(Permission::ALL.into_iter().map(|p| (p, false)).collect())
    }

    pub fn granted(&self, permission: Permission) -> bool {
        self.0.get(&permission).copied().unwrap_or(false)
    }

    pub fn set(&mut self, permission: Permission, value: bool) {
        self.0.insert(permission, value);
    }

    pub fn with(mut self, permission: Permission, value: bool) -> Self {
        self.set(permission, value);
        self
    }

    /// Overlay `update` on top of this map (keys in `update` win).
    pub fn merge(&mut self, update: &PermissionMap) {
        for (p, v) in &update.0 {
            self.0.insert(*p, *v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permission, bool)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Permission, bool)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (Permission, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of checking wire keys against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValidation {
    pub valid: bool,
    pub invalid_keys: Vec<String>,
}

/// Check that every key of a wire-level object belongs to the registry.
pub fn validate_keys(map: &serde_json::Map<String, JsonValue>) -> KeyValidation {
    let invalid_keys: Vec<String> = map
        .keys()
        .filter(|k| Permission::from_key(k).is_none())
        .cloned()
        .collect();
    KeyValidation {
        valid: invalid_keys.is_empty(),
        invalid_keys,
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionValidationError {
    #[error("Permissions object is required")]
    NotAnObject,

    #[error("Invalid permission keys: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    #[error("Permission values must be boolean. Invalid: {}", .0.join(", "))]
    NonBoolean(Vec<String>),
}

/// Parse an admin permission-update payload into a partial [`PermissionMap`].
///
/// Unknown keys are reported before non-boolean values.
pub fn parse_permission_update(
    value: &JsonValue,
) -> Result<PermissionMap, PermissionValidationError> {
    let map = value
        .as_object()
        .ok_or(PermissionValidationError::NotAnObject)?;

    let validation = validate_keys(map);
    if !validation.valid {
        return Err(PermissionValidationError::UnknownKeys(validation.invalid_keys));
    }

    let non_boolean: Vec<String> = map
        .iter()
        .filter(|(_, v)| !v.is_boolean())
        .map(|(k, _)| k.clone())
        .collect();
    if !non_boolean.is_empty() {
        return Err(PermissionValidationError::NonBoolean(non_boolean));
    }

    Ok(map
        .iter()
        .filter_map(|(k, v)| Some((Permission::from_key(k)?, v.as_bool()?)))
        .collect())
}

/// Registry entry (for display in admin tooling).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub key: Permission,
    pub label: &'static str,
    pub description: &'static str,
}

/// The full, ordered permission registry.
pub fn registry() -> Vec<PermissionDefinition> {
    Permission::ALL
        .into_iter()
        .map(|key| PermissionDefinition {
            key,
            label: key.label(),
            description: key.description(),
        })
        .collect()
}
