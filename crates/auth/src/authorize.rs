use thiserror::Error;

use crate::{Permission, Principal};

/// What an operation demands of its caller, beyond being authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Caller must hold the admin role.
    Admin,
    /// Caller must hold this single permission.
    Permission(Permission),
    /// Caller must hold at least one of these.
    AnyOf(Vec<Permission>),
    /// Caller must hold all of these.
    AllOf(Vec<Permission>),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Admin access required. You do not have permission to perform this action.")]
    AdminRequired,

    #[error("You do not have permission to perform this action.")]
    MissingPermission { required: Vec<Permission> },

    #[error("You do not have all required permissions for this action.")]
    MissingPermissions { missing: Vec<Permission> },
}

impl AuthzError {
    /// Permissions that would have satisfied (or are still missing for) the
    /// failed requirement. Empty for [`AuthzError::AdminRequired`].
    pub fn permissions(&self) -> &[Permission] {
        match self {
            AuthzError::AdminRequired => &[],
            AuthzError::MissingPermission { required } => required,
            AuthzError::MissingPermissions { missing } => missing,
        }
    }
}

/// Check a resolved principal against a requirement.
///
/// Pure policy: no IO, no ownership rules (those live with the records).
pub fn authorize(principal: &Principal, requirement: &Requirement) -> Result<(), AuthzError> {
    let actor = &principal.actor;
    match requirement {
        Requirement::Admin => {
            if actor.is_admin() {
                Ok(())
            } else {
                Err(AuthzError::AdminRequired)
            }
        }
        Requirement::Permission(p) => {
            if actor.has_permission(*p) {
                Ok(())
            } else {
                Err(AuthzError::MissingPermission { required: vec![*p] })
            }
        }
        Requirement::AnyOf(ps) => {
            if actor.has_any(ps) {
                Ok(())
            } else {
                Err(AuthzError::MissingPermission {
                    required: ps.clone(),
                })
            }
        }
        Requirement::AllOf(ps) => {
            let missing = actor.missing(ps);
            if missing.is_empty() {
                Ok(())
            } else {
                Err(AuthzError::MissingPermissions { missing })
            }
        }
    }
}
