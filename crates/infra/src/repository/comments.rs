use casetrack_auth::Principal;
use casetrack_cases::{ActivityEvent, Comment, CommentAction};
use casetrack_core::{CaseId, CommentId, DomainError, DomainResult};

use super::{Committed, Repository};
use crate::store::{DocumentStore, WriteBatch};

impl<S> Repository<S>
where
    S: DocumentStore,
{
    fn load_comment(&self, case_id: CaseId, id: CommentId) -> DomainResult<Comment> {
        self.load_case(case_id)?;
        self.store
            .get_comment(case_id, id)?
            .ok_or_else(|| DomainError::not_found("Comment not found"))
    }

    /// Post a comment; logs a "comment added" entry on the case.
    pub fn add_comment(
        &self,
        caller: &Principal,
        case_id: CaseId,
        message: &str,
    ) -> DomainResult<Committed<Comment>> {
        self.load_case(case_id)?;
        let by = Self::performer(caller);
        let comment = Comment::post(case_id, &by, message, Self::now())?;
        self.store.insert_comment(comment.clone())?;
        tracing::info!(case_id = %case_id, comment_id = %comment.id, actor = %caller.user_id, "comment added");

        let unrecorded = self.record(
            case_id,
            vec![ActivityEvent::CommentAdded {
                comment_id: comment.id,
            }],
            &by,
        );
        Ok(Committed {
            value: comment,
            unrecorded,
        })
    }

    /// Oldest first.
    pub fn list_comments(&self, case_id: CaseId) -> DomainResult<Vec<Comment>> {
        self.load_case(case_id)?;
        Ok(self.store.list_comments(case_id)?)
    }

    pub fn edit_comment(
        &self,
        caller: &Principal,
        case_id: CaseId,
        id: CommentId,
        message: &str,
    ) -> DomainResult<Comment> {
        let mut comment = self.load_comment(case_id, id)?;
        comment.ensure_modifiable_by(&caller.user_id, caller.is_admin(), CommentAction::Edit)?;
        comment.edit(message, Self::now())?;
        self.store.put_comment(comment.clone())?;
        tracing::info!(case_id = %case_id, comment_id = %id, actor = %caller.user_id, "comment edited");
        Ok(comment)
    }

    pub fn delete_comment(&self, caller: &Principal, case_id: CaseId, id: CommentId) -> DomainResult<()> {
        let comment = self.load_comment(case_id, id)?;
        comment.ensure_modifiable_by(&caller.user_id, caller.is_admin(), CommentAction::Delete)?;
        let mut batch = WriteBatch::new();
        batch.delete_comment(case_id, id);
        self.store.commit(batch)?;
        tracing::info!(case_id = %case_id, comment_id = %id, actor = %caller.user_id, "comment deleted");
        Ok(())
    }
}
