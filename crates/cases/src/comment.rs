use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casetrack_core::{CaseId, CommentId, DomainError, DomainResult, UserId};

use crate::{Performer, validation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub case_id: CaseId,
    pub author_id: UserId,
    /// Snapshot of the author's display name at posting time.
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Edit,
    Delete,
}

impl Comment {
    pub fn post(
        case_id: CaseId,
        by: &Performer,
        message: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: CommentId::new(),
            case_id,
            author_id: by.uid.clone(),
            author_name: by.name.clone(),
            message: validation::comment_message(message)?,
            created_at: now,
            edited_at: None,
        })
    }

    /// Only the author or an admin may change a comment.
    pub fn ensure_modifiable_by(
        &self,
        caller: &UserId,
        is_admin: bool,
        action: CommentAction,
    ) -> DomainResult<()> {
        if is_admin || &self.author_id == caller {
            return Ok(());
        }
        Err(DomainError::forbidden(match action {
            CommentAction::Edit => "You can only edit your own comments",
            CommentAction::Delete => "You can only delete your own comments",
        }))
    }

    pub fn edit(&mut self, message: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.message = validation::comment_message(message)?;
        self.edited_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> Performer {
        Performer::new(UserId::new("u-bob"), "Bob")
    }

    #[test]
    fn post_trims_message() {
        let c = Comment::post(CaseId::new(), &bob(), "  looking into it ", Utc::now()).unwrap();
        assert_eq!(c.message, "looking into it");
        assert_eq!(c.edited_at, None);
    }

    #[test]
    fn only_author_or_admin_may_modify() {
        let c = Comment::post(CaseId::new(), &bob(), "looking into it", Utc::now()).unwrap();
        let other = UserId::new("u-eve");
        assert!(c.ensure_modifiable_by(&bob().uid, false, CommentAction::Edit).is_ok());
        assert!(c.ensure_modifiable_by(&other, true, CommentAction::Delete).is_ok());
        assert_eq!(
            c.ensure_modifiable_by(&other, false, CommentAction::Delete)
                .unwrap_err()
                .to_string(),
            "You can only delete your own comments"
        );
    }

    #[test]
    fn edit_sets_edited_at_and_rejects_blank() {
        let mut c = Comment::post(CaseId::new(), &bob(), "first", Utc::now()).unwrap();
        assert!(c.edit("   ", Utc::now()).is_err());
        c.edit("second", Utc::now()).unwrap();
        assert_eq!(c.message, "second");
        assert!(c.edited_at.is_some());
    }
}
