//! Length rules for user-supplied text.
//!
//! All lengths are counted in characters after trimming.

use casetrack_core::{DomainError, DomainResult};

pub const TITLE_LEN: (usize, usize) = (3, 200);
pub const DESCRIPTION_LEN: (usize, usize) = (10, 5000);
pub const COMMENT_LEN: (usize, usize) = (1, 2000);

fn bounded(label: &str, value: &str, (min, max): (usize, usize)) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{label} is required")));
    }
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(format!(
            "{label} must be between {min} and {max} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn title(value: &str) -> DomainResult<String> {
    bounded("Title", value, TITLE_LEN)
}

pub fn description(value: &str) -> DomainResult<String> {
    bounded("Description", value, DESCRIPTION_LEN)
}

pub fn comment_message(value: &str) -> DomainResult<String> {
    if value.trim().is_empty() {
        return Err(DomainError::validation("Comment message is required"));
    }
    bounded("Comment", value, COMMENT_LEN)
}
