//! Document-store seam.
//!
//! The repository talks to persistence exclusively through [`DocumentStore`].
//! The store is document-shaped: users keyed by uid, cases keyed by id, and
//! each case owning two sub-collections (comments, activities).
//!
//! ## Guarantees a backend must give
//!
//! - Single-document writes are atomic.
//! - [`DocumentStore::update_case`] honours [`ExpectedVersion`] and bumps the
//!   case version on every successful write.
//! - [`DocumentStore::commit`] applies a [`WriteBatch`] all-or-nothing.
//!
//! There are no in-process locks above this seam.

use std::sync::Arc;

use thiserror::Error;

use casetrack_auth::User;
use casetrack_cases::{Activity, Case, Comment};
use casetrack_core::{ActivityId, CaseId, CommentId, DomainError, ExpectedVersion, UserId};

mod in_memory;

pub use in_memory::InMemoryDocumentStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document already exists: {0}")]
    AlreadyExists(String),

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(msg) => DomainError::not_found(msg),
            StoreError::AlreadyExists(msg) => DomainError::conflict(msg),
            StoreError::Concurrency(_) => DomainError::concurrency(
                "The case was modified by another request. Reload and try again.",
            ),
            StoreError::Unavailable(msg) => DomainError::dependency(msg),
        }
    }
}

/// One page request over the case collection, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasePageRequest {
    /// Start strictly after this case. Unknown ids restart from the top.
    pub after: Option<CaseId>,
    pub limit: usize,
}

/// A single deletion inside a [`WriteBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    DeleteComment { case_id: CaseId, comment_id: CommentId },
    DeleteActivity { case_id: CaseId, activity_id: ActivityId },
    DeleteCase { case_id: CaseId },
}

/// All-or-nothing group of deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete_comment(&mut self, case_id: CaseId, comment_id: CommentId) -> &mut Self {
        self.ops.push(WriteOp::DeleteComment {
            case_id,
            comment_id,
        });
        self
    }

    pub fn delete_activity(&mut self, case_id: CaseId, activity_id: ActivityId) -> &mut Self {
        self.ops.push(WriteOp::DeleteActivity {
            case_id,
            activity_id,
        });
        self
    }

    pub fn delete_case(&mut self, case_id: CaseId) -> &mut Self {
        self.ops.push(WriteOp::DeleteCase { case_id });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

pub trait DocumentStore: Send + Sync {
    // users
    fn get_user(&self, uid: &UserId) -> Result<Option<User>, StoreError>;
    /// Fails with `AlreadyExists` if the uid is taken.
    fn insert_user(&self, user: User) -> Result<(), StoreError>;
    /// Replace an existing user record.
    fn put_user(&self, user: User) -> Result<(), StoreError>;
    fn list_users(&self) -> Result<Vec<User>, StoreError>;
    fn count_users(&self) -> Result<usize, StoreError>;

    // cases
    fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError>;
    /// Store a new case; the stored copy (with its initial version) is returned.
    fn insert_case(&self, case: Case) -> Result<Case, StoreError>;
    fn update_case(&self, case: Case, expected: ExpectedVersion) -> Result<Case, StoreError>;
    fn page_cases(&self, request: CasePageRequest) -> Result<Vec<Case>, StoreError>;
    fn all_cases(&self) -> Result<Vec<Case>, StoreError>;

    // comments (oldest first)
    fn get_comment(&self, case_id: CaseId, id: CommentId) -> Result<Option<Comment>, StoreError>;
    fn insert_comment(&self, comment: Comment) -> Result<(), StoreError>;
    fn put_comment(&self, comment: Comment) -> Result<(), StoreError>;
    fn list_comments(&self, case_id: CaseId) -> Result<Vec<Comment>, StoreError>;

    // activities (newest first)
    fn append_activity(&self, activity: Activity) -> Result<(), StoreError>;
    fn list_activities(&self, case_id: CaseId) -> Result<Vec<Activity>, StoreError>;

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get_user(&self, uid: &UserId) -> Result<Option<User>, StoreError> {
        (**self).get_user(uid)
    }

    fn insert_user(&self, user: User) -> Result<(), StoreError> {
        (**self).insert_user(user)
    }

    fn put_user(&self, user: User) -> Result<(), StoreError> {
        (**self).put_user(user)
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        (**self).list_users()
    }

    fn count_users(&self) -> Result<usize, StoreError> {
        (**self).count_users()
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError> {
        (**self).get_case(id)
    }

    fn insert_case(&self, case: Case) -> Result<Case, StoreError> {
        (**self).insert_case(case)
    }

    fn update_case(&self, case: Case, expected: ExpectedVersion) -> Result<Case, StoreError> {
        (**self).update_case(case, expected)
    }

    fn page_cases(&self, request: CasePageRequest) -> Result<Vec<Case>, StoreError> {
        (**self).page_cases(request)
    }

    fn all_cases(&self) -> Result<Vec<Case>, StoreError> {
        (**self).all_cases()
    }

    fn get_comment(&self, case_id: CaseId, id: CommentId) -> Result<Option<Comment>, StoreError> {
        (**self).get_comment(case_id, id)
    }

    fn insert_comment(&self, comment: Comment) -> Result<(), StoreError> {
        (**self).insert_comment(comment)
    }

    fn put_comment(&self, comment: Comment) -> Result<(), StoreError> {
        (**self).put_comment(comment)
    }

    fn list_comments(&self, case_id: CaseId) -> Result<Vec<Comment>, StoreError> {
        (**self).list_comments(case_id)
    }

    fn append_activity(&self, activity: Activity) -> Result<(), StoreError> {
        (**self).append_activity(activity)
    }

    fn list_activities(&self, case_id: CaseId) -> Result<Vec<Activity>, StoreError> {
        (**self).list_activities(case_id)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        (**self).commit(batch)
    }
}
