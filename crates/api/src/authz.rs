//! Access-control gate: the per-operation role/permission table.
//!
//! Handlers call [`gate`] first thing, after the auth middleware has resolved
//! the caller. Rules that depend on stored documents (ownership, field
//! presence) are applied later by the repository.

use casetrack_auth::{AuthzError, Permission, Requirement, authorize};

use crate::context::CallerContext;

/// Every operation exposed by the HTTP surface that needs a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetProfile,
    UpdateProfile,
    ListUsers,
    GetUser,
    ChangeRole,
    GetPermissions,
    SetPermissions,
    ListPermissionRegistry,
    CreateCase,
    ListCases,
    GetCase,
    UpdateCase,
    UpdateStatus,
    AssignCase,
    TakeCase,
    WatchCase,
    UnwatchCase,
    DeleteCase,
    AddComment,
    ListComments,
    EditComment,
    DeleteComment,
    ListActivities,
}

impl Operation {
    /// `None`: any authenticated caller.
    pub fn requirement(self) -> Option<Requirement> {
        use Operation::*;
        let permission = |p| Some(Requirement::Permission(p));
        match self {
            GetProfile | ListUsers | GetUser | ListPermissionRegistry | ListActivities => None,
            UpdateProfile => permission(Permission::ProfileManagement),
            ChangeRole | GetPermissions | SetPermissions => Some(Requirement::Admin),
            CreateCase => permission(Permission::CreateCase),
            ListCases | GetCase | ListComments => permission(Permission::ViewCases),
            UpdateCase => permission(Permission::EditOwnCases),
            UpdateStatus | AssignCase | DeleteCase => Some(Requirement::Admin),
            TakeCase => permission(Permission::AssignToSelf),
            WatchCase | UnwatchCase => permission(Permission::WatchCase),
            AddComment | EditComment | DeleteComment => permission(Permission::CommentOnCases),
        }
    }
}

/// Check the caller against the operation's requirement.
pub fn gate(caller: &CallerContext, operation: Operation) -> Result<(), AuthzError> {
    let Some(requirement) = operation.requirement() else {
        return Ok(());
    };
    authorize(caller.principal(), &requirement).inspect_err(|e| {
        tracing::debug!(
            uid = %caller.user_id(),
            operation = ?operation,
            error = %e,
            "operation denied"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use casetrack_auth::{Actor, PermissionMap, Principal};
    use casetrack_core::UserId;

    fn caller(actor: Actor) -> CallerContext {
        CallerContext::new(Principal {
            user_id: UserId::new("u-1"),
            name: "Test".into(),
            email: "t@example.com".into(),
            actor,
        })
    }

    #[test]
    fn admin_only_operations_reject_regular_users_with_full_map() {
        let all: PermissionMap = Permission::ALL.into_iter().map(|p| (p, true)).collect();
        let c = caller(Actor::Regular(all));
        for op in [
            Operation::UpdateStatus,
            Operation::AssignCase,
            Operation::DeleteCase,
            Operation::ChangeRole,
            Operation::SetPermissions,
        ] {
            assert_eq!(gate(&c, op), Err(AuthzError::AdminRequired), "{op:?}");
        }
    }

    #[test]
    fn permission_operations_follow_the_map() {
        let c = caller(Actor::Regular(
            PermissionMap::defaults().with(Permission::ViewCases, true),
        ));
        assert!(gate(&c, Operation::ListCases).is_ok());
        assert!(gate(&c, Operation::ListComments).is_ok());
        assert_eq!(
            gate(&c, Operation::AddComment),
            Err(AuthzError::MissingPermission {
                required: vec![Permission::CommentOnCases]
            })
        );
    }

    #[test]
    fn authenticated_only_operations_pass_with_empty_map() {
        let c = caller(Actor::Regular(PermissionMap::empty()));
        assert!(gate(&c, Operation::GetProfile).is_ok());
        assert!(gate(&c, Operation::ListActivities).is_ok());
        assert!(gate(&c, Operation::UpdateProfile).is_err());
    }

    #[test]
    fn admin_passes_every_gate() {
        let c = caller(Actor::Admin);
        assert!(gate(&c, Operation::DeleteCase).is_ok());
        assert!(gate(&c, Operation::TakeCase).is_ok());
    }
}
