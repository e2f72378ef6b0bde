// src/handlers/users.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermUsersManage, RequirePermission},
    },
    models::auth::{UpdateRolePayload, UpdateStatusPayload, User},
};

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "The signed-in user", body = User),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All accounts", body = Vec<User>),
        (status = 403, description = "Requires users:manage")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUsersManage>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list_users().await?;
    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 400, description = "An admin cannot demote themselves"),
        (status = 404, description = "User not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .user_service
        .update_role(&actor, user_id, payload.role)
        .await?;
    Ok((StatusCode::OK, Json(user)))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Account activated or deactivated", body = User),
        (status = 400, description = "An admin cannot deactivate themselves"),
        (status = 404, description = "User not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .user_service
        .set_active(&actor, user_id, payload.is_active)
        .await?;
    Ok((StatusCode::OK, Json(user)))
}
