use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    response::Response,
    routing::{get, patch},
};
use serde_json::json;

use casetrack_auth::registry;

use crate::app::errors::{ApiError, ApiJson};
use crate::app::{dto, services::AppServices};
use crate::authz::{Operation, gate};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", patch(update_profile))
        .route("/auth/users", get(list_users))
        .route("/auth/users/:uid", get(get_user))
        .route("/auth/users/:uid/role", patch(change_role))
        .route(
            "/auth/users/:uid/permissions",
            get(get_permissions).patch(set_permissions),
        )
        .route("/auth/permissions", get(permission_registry))
}

/// Public: the caller is not a user yet.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<ApiJson<dto::RegisterRequest>, ApiError>,
) -> Result<Response, ApiError> {
    let ApiJson(body) = body?;
    let user = services.repo.register(body.into_registration()?)?;
    Ok(dto::created(
        format!("User registered successfully as {}", user.role),
        user,
    ))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::GetProfile)?;
    let user = services.repo.user(caller.user_id())?;
    Ok(dto::ok(user))
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<ApiJson<dto::UpdateProfileRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::UpdateProfile)?;
    let ApiJson(body) = body?;
    let user = services
        .repo
        .update_profile(caller.principal(), body.name.as_deref().unwrap_or(""))?;
    Ok(dto::ok_with_message("Profile updated successfully", user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ListUsers)?;
    let users = services.repo.list_users()?;
    Ok(dto::listed(&users))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::GetUser)?;
    let (user, stats) = services.repo.user_with_stats(&dto::user_id(&uid)?)?;
    Ok(dto::ok(dto::user_with_stats(user, stats)))
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(uid): Path<String>,
    body: Result<ApiJson<dto::ChangeRoleRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ChangeRole)?;
    let ApiJson(body) = body?;
    let role = body.role()?;
    let user = services
        .repo
        .change_role(caller.principal(), &dto::user_id(&uid)?, role)?;
    Ok(dto::ok_with_message(
        format!("User role updated to {role}"),
        json!({ "uid": user.uid, "role": user.role }),
    ))
}

pub async fn get_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::GetPermissions)?;
    let uid = dto::user_id(&uid)?;
    let permissions = services.repo.permissions_of(&uid)?;
    let user = services.repo.user(&uid)?;
    Ok(dto::ok(json!({
        "uid": user.uid,
        "name": user.name,
        "permissions": permissions,
    })))
}

pub async fn set_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(uid): Path<String>,
    body: Result<ApiJson<dto::SetPermissionsRequest>, ApiError>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::SetPermissions)?;
    let ApiJson(body) = body?;
    let update = body.update()?;
    let uid = dto::user_id(&uid)?;
    let permissions = services.repo.set_permissions(&uid, &update)?;
    Ok(dto::ok_with_message(
        "User permissions updated successfully",
        json!({ "uid": uid, "permissions": permissions }),
    ))
}

pub async fn permission_registry(
    Extension(caller): Extension<CallerContext>,
) -> Result<Response, ApiError> {
    gate(&caller, Operation::ListPermissionRegistry)?;
    Ok(dto::ok(registry()))
}
