use casetrack_auth::Principal;
use casetrack_cases::{
    ActivityEvent, Case, CaseDraft, CasePatch, CaseStatus, Priority, generate_message,
};
use casetrack_core::{CaseId, DomainError, DomainResult, ExpectedVersion, UserId};

use super::{Committed, Repository};
use crate::store::{CasePageRequest, DocumentStore, WriteBatch};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size from a raw query value: missing, non-numeric or non-positive
/// values fall back to the default; larger values are capped.
pub fn clamp_limit(raw: Option<&str>) -> usize {
    match raw.and_then(|r| r.trim().parse::<i64>().ok()) {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseListQuery {
    pub status: Option<CaseStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub limit: usize,
    pub cursor: Option<CaseId>,
}

impl Default for CaseListQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

/// One page of cases.
///
/// `has_more`/`next_cursor` describe the underlying page; the status,
/// priority and search filters are applied afterwards, so a page may hold
/// fewer than `limit` cases even when more exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePage {
    pub cases: Vec<Case>,
    pub has_more: bool,
    pub next_cursor: Option<CaseId>,
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedCase {
    pub case_id: CaseId,
    pub comments: usize,
    pub activities: usize,
}

impl<S> Repository<S>
where
    S: DocumentStore,
{
    fn display_name(&self, uid: &UserId) -> DomainResult<Option<String>> {
        Ok(self.store.get_user(uid)?.map(|u| u.name))
    }

    /// Guarded write of `next` over the version it was read at, followed by
    /// the activity appends.
    fn commit_case(
        &self,
        read_version: u64,
        next: Case,
        events: Vec<ActivityEvent>,
        caller: &Principal,
    ) -> DomainResult<Committed<Case>> {
        let stored = self
            .store
            .update_case(next, ExpectedVersion(read_version))?;
        let unrecorded = self.record(stored.id, events, &Self::performer(caller));
        Ok(Committed {
            value: stored,
            unrecorded,
        })
    }

    pub fn create_case(&self, caller: &Principal, draft: CaseDraft) -> DomainResult<Committed<Case>> {
        let draft = draft.for_creator(caller.is_admin());
        // Unknown assignees are stored without a display name.
        let assignee_name = match &draft.assigned_to {
            Some(uid) => self.display_name(uid)?,
            None => None,
        };

        let by = Self::performer(caller);
        let case = Case::open(CaseId::new(), draft, &by, assignee_name, Self::now());
        let stored = self.store.insert_case(case)?;
        tracing::info!(case_id = %stored.id, actor = %caller.user_id, "case created");

        let unrecorded = self.record(stored.id, vec![ActivityEvent::CaseCreated], &by);
        Ok(Committed {
            value: stored,
            unrecorded,
        })
    }

    pub fn list_cases(&self, query: &CaseListQuery) -> DomainResult<CasePage> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let mut cases = self.store.page_cases(CasePageRequest {
            after: query.cursor,
            limit: limit + 1,
        })?;

        let has_more = cases.len() > limit;
        cases.truncate(limit);
        let next_cursor = if has_more {
            cases.last().map(|c| c.id)
        } else {
            None
        };

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        cases.retain(|c| {
            query.status.is_none_or(|s| c.status == s)
                && query.priority.is_none_or(|p| c.priority == p)
                && search.is_none_or(|needle| c.matches_search(needle))
        });

        Ok(CasePage {
            cases,
            has_more,
            next_cursor,
        })
    }

    pub fn get_case(&self, id: CaseId) -> DomainResult<Case> {
        self.load_case(id)
    }

    /// General edit. Admins may touch every field; owners only title and
    /// description. All changed fields land in one guarded write.
    pub fn update_case(
        &self,
        caller: &Principal,
        id: CaseId,
        patch: CasePatch,
    ) -> DomainResult<Committed<Case>> {
        let current = self.load_case(id)?;
        current.authorize_edit(&caller.user_id, caller.is_admin(), &patch)?;
        let patch = patch.validated()?;

        let assignee_name = match patch.new_assignee(&current) {
            Some(uid) => self.display_name(uid)?,
            None => None,
        };

        let mut next = current.clone();
        let events = next.apply_patch(patch, assignee_name, Self::now())?;
        let committed = self.commit_case(current.version, next, events, caller)?;
        tracing::info!(case_id = %id, actor = %caller.user_id, "case updated");
        Ok(committed)
    }

    pub fn update_status(
        &self,
        caller: &Principal,
        id: CaseId,
        status: CaseStatus,
    ) -> DomainResult<Committed<Case>> {
        let current = self.load_case(id)?;
        let mut next = current.clone();
        let event = next.set_status(status, Self::now())?;
        let committed = self.commit_case(current.version, next, event.into_iter().collect(), caller)?;
        tracing::info!(case_id = %id, status = %status, actor = %caller.user_id, "case status updated");
        Ok(committed)
    }

    /// Admin assignment; `None` unassigns. The target must exist.
    pub fn assign_case(
        &self,
        caller: &Principal,
        id: CaseId,
        assignee: Option<UserId>,
    ) -> DomainResult<Committed<Case>> {
        let current = self.load_case(id)?;
        let resolved = match assignee {
            Some(uid) => {
                let user = self
                    .store
                    .get_user(&uid)?
                    .ok_or_else(|| DomainError::not_found("Assigned user not found"))?;
                Some((uid, user.name))
            }
            None => None,
        };

        let mut next = current.clone();
        let event = next.assign(resolved, Self::now());
        let committed = self.commit_case(current.version, next, vec![event], caller)?;
        tracing::info!(case_id = %id, actor = %caller.user_id, "case assignment changed");
        Ok(committed)
    }

    /// "Take task": assign an unassigned case to the caller.
    pub fn take_case(&self, caller: &Principal, id: CaseId) -> DomainResult<Committed<Case>> {
        let current = self.load_case(id)?;
        let mut next = current.clone();
        let event = next.take(&Self::performer(caller), Self::now())?;
        let committed = self.commit_case(current.version, next, vec![event], caller)?;
        tracing::info!(case_id = %id, actor = %caller.user_id, "case taken");
        Ok(committed)
    }

    /// Watching logs no activity and leaves `updated_at` alone.
    pub fn watch_case(&self, caller: &Principal, id: CaseId) -> DomainResult<Case> {
        let current = self.load_case(id)?;
        let mut next = current.clone();
        next.watch(&caller.user_id)?;
        let stored = self
            .store
            .update_case(next, ExpectedVersion::of(&current))?;
        tracing::info!(case_id = %id, actor = %caller.user_id, "case watched");
        Ok(stored)
    }

    /// Idempotent counterpart of [`Repository::watch_case`].
    pub fn unwatch_case(&self, caller: &Principal, id: CaseId) -> DomainResult<Case> {
        let current = self.load_case(id)?;
        let mut next = current.clone();
        if !next.unwatch(&caller.user_id) {
            return Ok(current);
        }
        let stored = self
            .store
            .update_case(next, ExpectedVersion::of(&current))?;
        tracing::info!(case_id = %id, actor = %caller.user_id, "case unwatched");
        Ok(stored)
    }

    /// Delete a case together with all its comments and activity entries in
    /// one all-or-nothing batch.
    pub fn delete_case(&self, caller: &Principal, id: CaseId) -> DomainResult<DeletedCase> {
        self.load_case(id)?;
        let comments = self.store.list_comments(id)?;
        let activities = self.store.list_activities(id)?;

        let mut batch = WriteBatch::new();
        for comment in &comments {
            batch.delete_comment(id, comment.id);
        }
        for activity in &activities {
            batch.delete_activity(id, activity.id);
        }
        batch.delete_case(id);
        self.store.commit(batch)?;

        // The ledger went with the case, so the deletion is only visible here.
        tracing::info!(
            case_id = %id,
            actor = %caller.user_id,
            comments = comments.len(),
            activities = activities.len(),
            "{}",
            generate_message(&ActivityEvent::CaseDeleted, &caller.name)
        );

        Ok(DeletedCase {
            case_id: id,
            comments: comments.len(),
            activities: activities.len(),
        })
    }
}
