//! User records: registration, profile edits and admin-side role/permission
//! management.
//!
//! The actual persistence lives in `casetrack-infra`; everything here is pure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casetrack_core::{DomainError, DomainResult, UserId};

use crate::{Actor, PermissionMap, Principal, Role};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: PermissionMap,
    pub created_at: DateTime<Utc>,
}

/// Validated self-registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub uid: UserId,
    pub name: String,
    pub email: String,
}

impl Registration {
    /// Trim the name and lower-case the email, rejecting bad input.
    pub fn new(uid: UserId, name: &str, email: &str) -> DomainResult<Self> {
        Ok(Self {
            uid,
            name: validate_display_name(name)?,
            email: normalize_email(email)?,
        })
    }
}

impl User {
    /// Build the stored record for a new registration.
    ///
    /// The very first user of the system becomes admin (with an empty
    /// permission map); everyone else starts as a regular user with every
    /// permission explicitly off.
    pub fn register(registration: Registration, is_first_user: bool, now: DateTime<Utc>) -> Self {
        let (role, permissions) = if is_first_user {
            (Role::Admin, PermissionMap::empty())
        } else {
            (Role::User, PermissionMap::defaults())
        };

        Self {
            uid: registration.uid,
            name: registration.name,
            email: registration.email,
            role,
            permissions,
            created_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn actor(&self) -> Actor {
        Actor::from_role(self.role, &self.permissions)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.uid.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            actor: self.actor(),
        }
    }

    /// Profile edit. Only the display name is user-editable.
    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        self.name = validate_display_name(name)?;
        Ok(())
    }

    /// Admin-side role change. An admin may not demote themselves.
    ///
    /// The stored permission map is left untouched in both directions.
    pub fn change_role(&mut self, role: Role, changed_by: &UserId) -> DomainResult<()> {
        if &self.uid == changed_by && role != Role::Admin {
            return Err(DomainError::conflict("You cannot demote yourself"));
        }
        self.role = role;
        Ok(())
    }

    /// Stored permission map as shown to admins, with unset keys filled in
    /// as `false`. Admin targets have no meaningful map.
    pub fn managed_permissions(&self) -> DomainResult<PermissionMap> {
        if self.is_admin() {
            return Err(DomainError::validation(
                "Admin users have full access. Permissions only apply to regular users.",
            ));
        }
        let mut map = PermissionMap::defaults();
        map.merge(&self.permissions);
        Ok(map)
    }

    /// Merge a (validated) partial map into the stored one.
    pub fn grant(&mut self, update: &PermissionMap) -> DomainResult<()> {
        if self.is_admin() {
            return Err(DomainError::validation(
                "Cannot set permissions for admin users. They have full access.",
            ));
        }
        self.permissions.merge(update);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field rules
// ─────────────────────────────────────────────────────────────────────────────

pub fn validate_display_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Name is required"));
    }
    let len = name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        return Err(DomainError::validation(format!(
            "Name must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }
    Ok(name.to_string())
}

/// Lower-case and shape-check an email address.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("Invalid email format"));
    }
    Ok(email)
}
