use axum::extract::OriginalUri;
use axum::http::Method;
use axum::response::Response;
use chrono::Utc;
use serde_json::json;

use crate::app::{dto, errors::ApiError};

pub async fn health() -> Response {
    dto::ok(json!({ "status": "ok", "timestamp": Utc::now() }))
}

/// `OriginalUri`: inside `/api` the router sees the path with the prefix stripped.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
