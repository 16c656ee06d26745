use serde::Serialize;

use casetrack_auth::{PermissionMap, Principal, Registration, Role, User};
use casetrack_cases::CaseStatus;
use casetrack_core::{DomainError, DomainResult, UserId};

use super::Repository;
use crate::store::{DocumentStore, StoreError};

/// Case counters shown next to a user profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub assigned_cases: usize,
    /// Assigned and not `Closed`.
    pub active_cases: usize,
    pub created_cases: usize,
}

fn user_not_found() -> DomainError {
    DomainError::not_found("User not found")
}

impl<S> Repository<S>
where
    S: DocumentStore,
{
    /// Self-registration. The first user of an empty system becomes admin.
    pub fn register(&self, registration: Registration) -> DomainResult<User> {
        if self.store.get_user(&registration.uid)?.is_some() {
            return Err(DomainError::conflict("User already registered"));
        }

        let is_first_user = self.store.count_users()? == 0;
        let user = User::register(registration, is_first_user, Self::now());
        self.store.insert_user(user.clone()).map_err(|e| match e {
            StoreError::AlreadyExists(_) => DomainError::conflict("User already registered"),
            other => other.into(),
        })?;

        tracing::info!(uid = %user.uid, role = %user.role, "user registered");
        Ok(user)
    }

    /// Lookup used by identity resolution; absence is not an error here.
    pub fn find_user(&self, uid: &UserId) -> DomainResult<Option<User>> {
        Ok(self.store.get_user(uid)?)
    }

    pub fn user(&self, uid: &UserId) -> DomainResult<User> {
        self.find_user(uid)?.ok_or_else(user_not_found)
    }

    pub fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self.store.list_users()?)
    }

    pub fn user_with_stats(&self, uid: &UserId) -> DomainResult<(User, UserStats)> {
        let user = self.user(uid)?;
        let mut stats = UserStats::default();
        for case in self.store.all_cases()? {
            if case.assigned_to.as_ref() == Some(uid) {
                stats.assigned_cases += 1;
                if case.status != CaseStatus::Closed {
                    stats.active_cases += 1;
                }
            }
            if &case.created_by == uid {
                stats.created_cases += 1;
            }
        }
        Ok((user, stats))
    }

    /// Rename the caller. Display names already copied into cases, comments
    /// and activity entries are left as they were.
    pub fn update_profile(&self, caller: &Principal, name: &str) -> DomainResult<User> {
        let mut user = self.user(&caller.user_id)?;
        user.rename(name)?;
        self.store.put_user(user.clone())?;
        tracing::info!(uid = %user.uid, "profile updated");
        Ok(user)
    }

    pub fn change_role(&self, caller: &Principal, uid: &UserId, role: Role) -> DomainResult<User> {
        let mut user = self.user(uid)?;
        user.change_role(role, &caller.user_id)?;
        self.store.put_user(user.clone())?;
        tracing::info!(uid = %uid, role = %role, actor = %caller.user_id, "role changed");
        Ok(user)
    }

    pub fn permissions_of(&self, uid: &UserId) -> DomainResult<PermissionMap> {
        self.user(uid)?.managed_permissions()
    }

    /// Merge a validated partial map into the target's stored permissions.
    pub fn set_permissions(&self, uid: &UserId, update: &PermissionMap) -> DomainResult<PermissionMap> {
        let mut user = self.user(uid)?;
        user.grant(update)?;
        self.store.put_user(user.clone())?;
        tracing::info!(uid = %uid, "permissions updated");
        user.managed_permissions()
    }
}
