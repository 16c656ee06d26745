//! Error → HTTP mapping and the JSON failure envelope.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use casetrack_auth::{AuthenticationError, AuthzError, PermissionValidationError};
use casetrack_core::DomainError;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Authorization(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    PermissionInput(#[from] PermissionValidationError),

    /// Malformed request (body, query string, field format).
    #[error("{0}")]
    BadRequest(String),

    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::PermissionInput(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) | DomainError::Conflict(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::Concurrency(_) => StatusCode::CONFLICT,
                DomainError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Client-facing text. Dependency failures are reduced to a generic line.
    fn public_message(&self) -> String {
        match self {
            ApiError::Domain(DomainError::Dependency(_)) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "success": false,
            "message": self.public_message(),
        });
        if let ApiError::Authorization(e) = &self {
            match e {
                AuthzError::MissingPermission { required } => {
                    body["requiredPermissions"] = json!(required);
                }
                AuthzError::MissingPermissions { missing } => {
                    body["missingPermissions"] = json!(missing);
                }
                AuthzError::AdminRequired => {}
            }
        }

        (status, Json(body)).into_response()
    }
}

/// `axum::Json` with rejections rendered in the failure envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Request body must be JSON (Content-Type: application/json)")
        }
        other => ApiError::bad_request(format!("Invalid JSON body: {}", other.body_text())),
    }
}
