use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::get,
};

use crate::app::errors::ApiError;
use crate::app::{dto, services::AppServices};
use crate::authz::{Operation, gate};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/cases/:id/activities", get(list_activities))
}

/// Newest first.
pub async fn list_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ListActivities)?;
    let activities = services.repo.list_activities(dto::case_id(&id)?)?;
    Ok(dto::listed(&activities))
}
