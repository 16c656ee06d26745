use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path, Query, rejection::QueryRejection},
    response::Response,
    routing::{get, patch},
};
use serde_json::json;

use crate::app::errors::{ApiError, ApiJson};
use crate::app::{dto, services::AppServices};
use crate::authz::{Operation, gate};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/cases", get(list_cases).post(create_case))
        .route(
            "/cases/:id",
            get(get_case).put(update_case).delete(delete_case),
        )
        .route("/cases/:id/status", patch(update_status))
        .route("/cases/:id/assign", patch(assign_case))
        .route("/cases/:id/take", patch(take_case))
        .route("/cases/:id/watch", patch(watch_case))
        .route("/cases/:id/unwatch", patch(unwatch_case))
}

pub async fn create_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<ApiJson<dto::CreateCaseRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::CreateCase)?;
    let ApiJson(body) = body?;
    let committed = services
        .repo
        .create_case(caller.principal(), body.into_draft(caller.is_admin())?)?;
    Ok(dto::created("Case created successfully", committed.value))
}

pub async fn list_cases(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    params: Result<Query<dto::ListCasesParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ListCases)?;
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = services.repo.list_cases(&params.into_query()?)?;
    Ok(dto::case_page(page))
}

pub async fn get_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::GetCase)?;
    let case = services.repo.get_case(dto::case_id(&id)?)?;
    Ok(dto::ok(case))
}

pub async fn update_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<ApiJson<dto::UpdateCaseRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::UpdateCase)?;
    let ApiJson(body) = body?;
    let id = dto::case_id(&id)?;
    let committed = services
        .repo
        .update_case(caller.principal(), id, body.into_patch(caller.is_admin())?)?;
    Ok(dto::ok_with_message("Case updated successfully", committed.value))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<ApiJson<dto::UpdateStatusRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::UpdateStatus)?;
    let ApiJson(body) = body?;
    let status = body.status()?;
    let case = services
        .repo
        .update_status(caller.principal(), dto::case_id(&id)?, status)?
        .value;
    Ok(dto::ok_with_message(
        format!("Case status updated to {}", case.status),
        json!({ "id": case.id, "status": case.status }),
    ))
}

pub async fn assign_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<ApiJson<dto::AssignRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::AssignCase)?;
    let ApiJson(body) = body?;
    let case = services
        .repo
        .assign_case(caller.principal(), dto::case_id(&id)?, body.assignee())?
        .value;
    let message = match &case.assigned_to_name {
        Some(name) => format!("Case assigned to {name}"),
        None => "Case unassigned".to_string(),
    };
    Ok(dto::ok_with_message(message, dto::assignment(&case)))
}

pub async fn take_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::TakeCase)?;
    let committed = services
        .repo
        .take_case(caller.principal(), dto::case_id(&id)?)?;
    Ok(dto::ok_with_message("You have taken this task", committed.value))
}

pub async fn watch_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::WatchCase)?;
    let case = services
        .repo
        .watch_case(caller.principal(), dto::case_id(&id)?)?;
    Ok(dto::ok_with_message(
        "You are now watching this case",
        dto::watching(&case, caller.user_id()),
    ))
}

pub async fn unwatch_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::UnwatchCase)?;
    let case = services
        .repo
        .unwatch_case(caller.principal(), dto::case_id(&id)?)?;
    Ok(dto::ok_with_message(
        "You have stopped watching this case",
        dto::watching(&case, caller.user_id()),
    ))
}

pub async fn delete_case(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::DeleteCase)?;
    let deleted = services
        .repo
        .delete_case(caller.principal(), dto::case_id(&id)?)?;
    Ok(dto::ok_with_message(
        "Case deleted successfully",
        json!({
            "id": deleted.case_id,
            "deletedComments": deleted.comments,
            "deletedActivities": deleted.activities,
        }),
    ))
}
