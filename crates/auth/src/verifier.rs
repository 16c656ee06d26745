use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{AuthenticationError, IdentityClaims, validate_claims};

/// Turns an opaque bearer token into verified identity claims.
///
/// Implementations must check the signature and the time window.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>)
    -> Result<IdentityClaims, AuthenticationError>;
}

/// HS256 shared-secret verifier.
pub struct Hs256IdentityVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Hs256IdentityVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign claims with the same secret (dev tooling and tests).
    pub fn issue(&self, claims: &IdentityClaims) -> Result<String, AuthenticationError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| AuthenticationError::InvalidToken)
    }
}

impl IdentityVerifier for Hs256IdentityVerifier {
    fn verify(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityClaims, AuthenticationError> {
        let data = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthenticationError::InvalidToken)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for Hs256IdentityVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256IdentityVerifier").finish_non_exhaustive()
    }
}
