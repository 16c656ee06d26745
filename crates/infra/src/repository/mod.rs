//! Repository operations: the mutating and reading use-cases over users,
//! cases, comments and the activity log.
//!
//! ## Execution model
//!
//! ```text
//! validate input
//!   ↓
//! read document(s)
//!   ↓
//! ownership / workflow rules (pure, in casetrack-cases / casetrack-auth)
//!   ↓
//! guarded write (ExpectedVersion of the read document)
//!   ↓
//! append activity entries (best effort)
//! ```
//!
//! Nothing is written when a pre-check fails. Permission gating
//! (`view_cases`, admin-only, ...) happens before these calls, in the API's
//! access-control gate; the repository only applies the rules that need the
//! stored documents (ownership, field presence, transitions).
//!
//! Activity appends happen after the primary write has committed. A failed
//! append does not fail the operation: it is logged at `warn` and reported
//! back through [`Committed::unrecorded`].

use chrono::{DateTime, Utc};

use casetrack_auth::Principal;
use casetrack_cases::{Activity, ActivityEvent, Case, Performer};
use casetrack_core::{CaseId, DomainError, DomainResult};

use crate::store::DocumentStore;

mod activity;
mod cases;
mod comments;
mod users;

pub use cases::{CaseListQuery, CasePage, DEFAULT_PAGE_SIZE, DeletedCase, MAX_PAGE_SIZE, clamp_limit};
pub use users::UserStats;

/// Result of a mutation whose primary write committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub value: T,
    /// Kinds of activity entries that could not be appended.
    pub unrecorded: Vec<&'static str>,
}

impl<T> Committed<T> {
    pub fn is_fully_recorded(&self) -> bool {
        self.unrecorded.is_empty()
    }
}

/// Case-tracking operations over a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct Repository<S> {
    store: S,
}

impl<S> Repository<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn performer(principal: &Principal) -> Performer {
        Performer::new(principal.user_id.clone(), principal.name.clone())
    }

    /// Load a case or fail with the user-facing not-found error.
    fn load_case(&self, id: CaseId) -> DomainResult<Case> {
        self.store
            .get_case(id)?
            .ok_or_else(|| DomainError::not_found("Case not found"))
    }

    /// Append activity entries for a committed mutation, in order.
    ///
    /// Never fails: each failed append is logged and its kind returned.
    fn record(
        &self,
        case_id: CaseId,
        events: Vec<ActivityEvent>,
        by: &Performer,
    ) -> Vec<&'static str> {
        let mut unrecorded = Vec::new();
        for event in events {
            let kind = event.kind();
            let activity = Activity::record(case_id, event, by, Self::now());
            if let Err(err) = self.store.append_activity(activity) {
                tracing::warn!(
                    case_id = %case_id,
                    activity_kind = kind,
                    actor = %by.uid,
                    error = %err,
                    "mutation committed but activity entry was not recorded"
                );
                unrecorded.push(kind);
            }
        }
        unrecorded
    }
}
