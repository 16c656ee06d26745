//! `casetrack-cases`: case records, the status workflow and the activity log.
//!
//! Everything here is pure: no IO, no clocks (callers pass `now`).

pub mod activity;
pub mod case;
pub mod comment;
pub mod status;
pub mod validation;

pub use activity::{Activity, ActivityEvent, EditedField, Performer, generate_message};
pub use case::{Case, CaseDraft, CasePatch, Priority};
pub use comment::{Comment, CommentAction};
pub use status::{CaseStatus, TransitionError, validate_transition};
