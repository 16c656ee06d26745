use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use casetrack_core::DomainError;

/// Workflow state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [CaseStatus::Open, CaseStatus::InProgress, CaseStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Open",
            CaseStatus::InProgress => "In Progress",
            CaseStatus::Closed => "Closed",
        }
    }

    /// Forward edges of the transition table. `Closed` is terminal.
    pub fn allowed_next(&self) -> &'static [CaseStatus] {
        match self {
            CaseStatus::Open => &[CaseStatus::InProgress],
            CaseStatus::InProgress => &[CaseStatus::Closed],
            CaseStatus::Closed => &[],
        }
    }

    /// Same-state requests are no-ops and always allowed.
    pub fn can_transition_to(&self, requested: CaseStatus) -> bool {
        *self == requested || self.allowed_next().contains(&requested)
    }
}

impl core::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| DomainError::validation("Status must be Open, In Progress, or Closed"))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Invalid status transition: {current} → {requested}. Allowed: {}",
    allowed_list(.allowed)
)]
pub struct TransitionError {
    pub current: CaseStatus,
    pub requested: CaseStatus,
    pub allowed: Vec<CaseStatus>,
}

fn allowed_list(allowed: &[CaseStatus]) -> String {
    if allowed.is_empty() {
        return "none".to_string();
    }
    allowed
        .iter()
        .map(CaseStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<TransitionError> for DomainError {
    fn from(value: TransitionError) -> Self {
        DomainError::conflict(value.to_string())
    }
}

pub fn validate_transition(
    current: CaseStatus,
    requested: CaseStatus,
) -> Result<(), TransitionError> {
    if current.can_transition_to(requested) {
        Ok(())
    } else {
        Err(TransitionError {
            current,
            requested,
            allowed: current.allowed_next().to_vec(),
        })
    }
}
