use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, patch},
};

use crate::app::errors::{ApiError, ApiJson};
use crate::app::{dto, services::AppServices};
use crate::authz::{Operation, gate};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/cases/:id/comments", get(list_comments).post(add_comment))
        .route(
            "/cases/:id/comments/:comment_id",
            patch(edit_comment).delete(delete_comment),
        )
}

pub async fn add_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<ApiJson<dto::CommentRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::AddComment)?;
    let ApiJson(body) = body?;
    let committed = services
        .repo
        .add_comment(caller.principal(), dto::case_id(&id)?, body.message())?;
    Ok(dto::created("Comment added successfully", committed.value))
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ListComments)?;
    let comments = services.repo.list_comments(dto::case_id(&id)?)?;
    Ok(dto::listed(&comments))
}

pub async fn edit_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((id, comment_id)): Path<(String, String)>,
    body: Result<ApiJson<dto::CommentRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::EditComment)?;
    let ApiJson(body) = body?;
    let comment = services.repo.edit_comment(
        caller.principal(),
        dto::case_id(&id)?,
        dto::comment_id(&comment_id)?,
        body.message(),
    )?;
    Ok(dto::ok_with_message("Comment updated successfully", comment))
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::DeleteComment)?;
    services.repo.delete_comment(
        caller.principal(),
        dto::case_id(&id)?,
        dto::comment_id(&comment_id)?,
    )?;
    Ok(dto::done("Comment deleted successfully"))
}
