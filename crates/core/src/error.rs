//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Authentication and permission-gate failures live in `casetrack-auth`; this
/// type covers everything decided after the caller has been let through the
/// gate (validation, ownership, workflow conflicts, store failures).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("{0}")]
    Validation(String),

    /// A requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// The caller passed the gate but an ownership rule denies the mutation.
    #[error("{0}")]
    Forbidden(String),

    /// A business rule conflict (invalid transition, already assigned, ...).
    #[error("{0}")]
    Conflict(String),

    /// A guarded write lost a race against a concurrent writer.
    #[error("{0}")]
    Concurrency(String),

    /// The backing store or another collaborator failed.
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn concurrency(msg: impl Into<String>) -> Self {
        Self::Concurrency(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Self::Dependency(msg.into())
    }
}
