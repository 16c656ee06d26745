use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use casetrack_auth::{AuthenticationError, IdentityVerifier};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub services: Arc<AppServices>,
}

/// Identity resolution: bearer token → verified claims → stored user.
///
/// Runs before any permission check, so authentication failures always mask
/// authorization failures.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;
    let claims = state.verifier.verify(token, Utc::now())?;

    let user = state
        .services
        .repo
        .find_user(claims.user_id())?
        .ok_or(AuthenticationError::UnknownUser)?;

    req.extensions_mut()
        .insert(CallerContext::new(user.principal()));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthenticationError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthenticationError::MissingToken)?;

    let header = header
        .to_str()
        .map_err(|_| AuthenticationError::InvalidToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthenticationError::MissingToken)?
        .trim();
    if token.is_empty() {
        return Err(AuthenticationError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(
            extract_bearer(&HeaderMap::new()),
            Err(AuthenticationError::MissingToken)
        );
        assert_eq!(
            extract_bearer(&headers("Basic abc")),
            Err(AuthenticationError::MissingToken)
        );
        assert_eq!(
            extract_bearer(&headers("Bearer   ")),
            Err(AuthenticationError::MissingToken)
        );
    }
}
