use casetrack_core::UserId;

use crate::{Permission, PermissionMap, Role};

/// Who is acting, for permission evaluation purposes.
///
/// Admins hold every permission regardless of any stored map, so the map is
/// only carried for regular users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Regular(PermissionMap),
}

impl Actor {
    pub fn from_role(role: Role, permissions: &PermissionMap) -> Self {
        match role {
            Role::Admin => Actor::Admin,
            Role::User => Actor::Regular(permissions.clone()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            Actor::Admin => true,
            Actor::Regular(map) => map.granted(permission),
        }
    }

    /// OR combinator. An empty list grants nothing to regular users.
    pub fn has_any(&self, permissions: &[Permission]) -> bool {
        self.is_admin() || permissions.iter().any(|p| self.has_permission(*p))
    }

    /// AND combinator.
    pub fn has_all(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn missing(&self, permissions: &[Permission]) -> Vec<Permission> {
        permissions
            .iter()
            .copied()
            .filter(|p| !self.has_permission(*p))
            .collect()
    }
}

/// A fully resolved, authenticated caller.
///
/// The name is the display name at request time; it is copied into the
/// records this caller writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub actor: Actor,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.actor.is_admin()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.actor.has_permission(permission)
    }
}
