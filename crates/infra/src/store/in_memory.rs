use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use casetrack_auth::User;
use casetrack_cases::{Activity, Case, Comment};
use casetrack_core::{CaseId, CommentId, ExpectedVersion, UserId, Versioned};

use super::{CasePageRequest, DocumentStore, StoreError, WriteBatch, WriteOp};

/// A case together with the sub-collections it owns.
#[derive(Debug, Clone)]
struct CaseDocument {
    case: Case,
    comments: Vec<Comment>,
    activities: Vec<Activity>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    cases: HashMap<CaseId, CaseDocument>,
}

/// In-memory document store.
///
/// Intended for tests/dev and as the reference behaviour of the seam.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<State>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

fn case_missing(id: CaseId) -> StoreError {
    StoreError::NotFound(format!("case {id}"))
}

/// Newest first; ids break ties so paging is stable.
fn newest_first(a: &Case, b: &Case) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

impl State {
    fn check(&self, op: &WriteOp) -> Result<(), StoreError> {
        let doc = |case_id: &CaseId| self.cases.get(case_id).ok_or_else(|| case_missing(*case_id));
        match op {
            WriteOp::DeleteComment {
                case_id,
                comment_id,
            } => {
                if doc(case_id)?.comments.iter().any(|c| c.id == *comment_id) {
                    Ok(())
                } else {
                    Err(StoreError::NotFound(format!("comment {comment_id}")))
                }
            }
            WriteOp::DeleteActivity {
                case_id,
                activity_id,
            } => {
                if doc(case_id)?.activities.iter().any(|a| a.id == *activity_id) {
                    Ok(())
                } else {
                    Err(StoreError::NotFound(format!("activity {activity_id}")))
                }
            }
            WriteOp::DeleteCase { case_id } => doc(case_id).map(|_| ()),
        }
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::DeleteComment {
                case_id,
                comment_id,
            } => {
                if let Some(doc) = self.cases.get_mut(&case_id) {
                    doc.comments.retain(|c| c.id != comment_id);
                }
            }
            WriteOp::DeleteActivity {
                case_id,
                activity_id,
            } => {
                if let Some(doc) = self.cases.get_mut(&case_id) {
                    doc.activities.retain(|a| a.id != activity_id);
                }
            }
            WriteOp::DeleteCase { case_id } => {
                self.cases.remove(&case_id);
            }
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_user(&self, uid: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(uid).cloned())
    }

    fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users.contains_key(&user.uid) {
            return Err(StoreError::AlreadyExists(format!("user {}", user.uid)));
        }
        state.users.insert(user.uid.clone(), user);
        Ok(())
    }

    fn put_user(&self, user: User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        match state.users.get_mut(&user.uid) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.uid))),
        }
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.uid.cmp(&b.uid)));
        Ok(users)
    }

    fn count_users(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.users.len())
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError> {
        Ok(self.read()?.cases.get(&id).map(|d| d.case.clone()))
    }

    fn insert_case(&self, mut case: Case) -> Result<Case, StoreError> {
        let mut state = self.write()?;
        if state.cases.contains_key(&case.id) {
            return Err(StoreError::AlreadyExists(format!("case {}", case.id)));
        }
        case.version = 1;
        state.cases.insert(
            case.id,
            CaseDocument {
                case: case.clone(),
                comments: Vec::new(),
                activities: Vec::new(),
            },
        );
        Ok(case)
    }

    fn update_case(&self, mut case: Case, expected: ExpectedVersion) -> Result<Case, StoreError> {
        let mut state = self.write()?;
        let doc = state
            .cases
            .get_mut(&case.id)
            .ok_or_else(|| case_missing(case.id))?;

        let current = doc.case.version();
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "case {}: expected {expected:?}, found {current}",
                case.id
            )));
        }

        case.version = current + 1;
        doc.case = case.clone();
        Ok(case)
    }

    fn page_cases(&self, request: CasePageRequest) -> Result<Vec<Case>, StoreError> {
        let state = self.read()?;
        let mut cases: Vec<&Case> = state.cases.values().map(|d| &d.case).collect();
        cases.sort_by(|a, b| newest_first(a, b));

        let start = request
            .after
            .and_then(|after| cases.iter().position(|c| c.id == after))
            .map(|idx| idx + 1)
            .unwrap_or(0);

        Ok(cases
            .into_iter()
            .skip(start)
            .take(request.limit)
            .cloned()
            .collect())
    }

    fn all_cases(&self) -> Result<Vec<Case>, StoreError> {
        let mut cases: Vec<Case> = self.read()?.cases.values().map(|d| d.case.clone()).collect();
        cases.sort_by(newest_first);
        Ok(cases)
    }

    fn get_comment(&self, case_id: CaseId, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let state = self.read()?;
        Ok(state
            .cases
            .get(&case_id)
            .and_then(|d| d.comments.iter().find(|c| c.id == id).cloned()))
    }

    fn insert_comment(&self, comment: Comment) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let doc = state
            .cases
            .get_mut(&comment.case_id)
            .ok_or_else(|| case_missing(comment.case_id))?;
        doc.comments.push(comment);
        Ok(())
    }

    fn put_comment(&self, comment: Comment) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let doc = state
            .cases
            .get_mut(&comment.case_id)
            .ok_or_else(|| case_missing(comment.case_id))?;
        match doc.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => {
                *existing = comment;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("comment {}", comment.id))),
        }
    }

    fn list_comments(&self, case_id: CaseId) -> Result<Vec<Comment>, StoreError> {
        let state = self.read()?;
        let doc = state.cases.get(&case_id).ok_or_else(|| case_missing(case_id))?;
        let mut comments = doc.comments.clone();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    fn append_activity(&self, activity: Activity) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let doc = state
            .cases
            .get_mut(&activity.case_id)
            .ok_or_else(|| case_missing(activity.case_id))?;
        doc.activities.push(activity);
        Ok(())
    }

    fn list_activities(&self, case_id: CaseId) -> Result<Vec<Activity>, StoreError> {
        let state = self.read()?;
        let doc = state.cases.get(&case_id).ok_or_else(|| case_missing(case_id))?;
        // Reverse first so equal timestamps keep newest-appended first.
        let mut activities: Vec<Activity> = doc.activities.iter().rev().cloned().collect();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activities)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.write()?;
        for op in batch.ops() {
            state.check(op)?;
        }
        for op in batch.ops() {
            state.apply(*op);
        }
        Ok(())
    }
}
