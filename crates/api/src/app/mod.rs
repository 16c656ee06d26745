//! HTTP application wiring (axum router + shared services).
//!
//! - `services.rs`: the repository over the document store
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request bodies and response envelopes
//! - `errors.rs`: error → status mapping

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use casetrack_auth::{Hs256IdentityVerifier, IdentityVerifier};

use crate::config::ApiConfig;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Fits a maximum-length title and description in 4-byte UTF-8 plus JSON framing.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Router backed by a fresh in-memory store (entrypoint used by `main.rs`).
pub fn build_app(config: &ApiConfig) -> Router {
    let verifier = Arc::new(Hs256IdentityVerifier::new(config.jwt_secret.as_bytes()));
    build_app_with(Arc::new(services::AppServices::in_memory()), verifier)
}

pub fn build_app_with(
    services: Arc<services::AppServices>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Router {
    let auth_state = AuthState {
        verifier,
        services: services.clone(),
    };

    // `route_layer`: unknown paths reach the fallback without a token check.
    let protected = routes::protected().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/register", post(routes::auth::register))
        .merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}
