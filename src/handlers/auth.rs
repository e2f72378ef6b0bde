// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::AppJson,
    },
    config::AppState,
    models::auth::{
        AuthResponse, ForgotPasswordPayload, LoginUserPayload, RegisterUserPayload,
        ResetPasswordPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Account created; the first account becomes ADMIN", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .register_user(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Wrong credentials or inactive account")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (token, user) = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 202, description = "A reset code was issued if the account exists")
    )
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Same answer whether or not the email exists.
    app_state.auth_service.request_password_reset(&payload.email).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "If the account exists, a reset code has been issued." })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid or expired code")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
