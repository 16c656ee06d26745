use axum::Router;

pub mod activities;
pub mod auth;
pub mod cases;
pub mod comments;
pub mod system;

/// Every endpoint that needs an authenticated caller.
pub fn protected() -> Router {
    Router::new()
        .merge(auth::router())
        .merge(cases::router())
        .merge(comments::router())
        .merge(activities::router())
}
