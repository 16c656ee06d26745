use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use casetrack_core::UserId;

/// Claims carried by an identity token.
///
/// Timestamps are unix seconds, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// The user id.
    pub sub: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl IdentityClaims {
    pub fn user_id(&self) -> &UserId {
        &self.sub
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("No authentication token provided")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token has expired")]
    Expired,

    #[error("User not found in database")]
    UnknownUser,
}

/// Tolerated clock skew between the identity provider and this service.
pub const ISSUED_AT_SKEW_SECS: i64 = 60;

/// Validate the time window of decoded claims.
///
/// Signature verification happens before this; this only checks `iat`/`exp`
/// against the supplied clock.
pub fn validate_claims(
    claims: &IdentityClaims,
    now: DateTime<Utc>,
) -> Result<(), AuthenticationError> {
    if claims.exp <= claims.iat {
        return Err(AuthenticationError::InvalidToken);
    }

    let now = now.timestamp();
    if now + ISSUED_AT_SKEW_SECS < claims.iat {
        return Err(AuthenticationError::InvalidToken);
    }
    if now >= claims.exp {
        return Err(AuthenticationError::Expired);
    }

    Ok(())
}
