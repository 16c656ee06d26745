use casetrack_cases::Activity;
use casetrack_core::{CaseId, DomainResult};

use super::Repository;
use crate::store::DocumentStore;

impl<S> Repository<S>
where
    S: DocumentStore,
{
    /// A case's activity ledger, newest first (snapshot read).
    pub fn list_activities(&self, case_id: CaseId) -> DomainResult<Vec<Activity>> {
        self.load_case(case_id)?;
        Ok(self.store.list_activities(case_id)?)
    }
}
