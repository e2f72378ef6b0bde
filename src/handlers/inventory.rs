// src/handlers/inventory.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermAdjustmentsWrite, PermAlertsResolve, PermRead, RequirePermission},
    },
    models::inventory::{
        AlertQuery, CreateAdjustmentPayload, LowStockAlert, LowStockAlertEntry, MoveHistoryEntry,
        MoveHistoryQuery, StockAdjustment, StockLevel, StockQuery,
    },
};

// ---
// Stock
// ---

#[utoipa::path(
    get,
    path = "/api/stock",
    tag = "Inventory",
    params(StockQuery),
    responses((status = 200, description = "Quantity per product and location", body = Vec<StockLevel>)),
    security(("api_jwt" = []))
)]
pub async fn list_stock(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<StockQuery>,
) -> Result<impl IntoResponse, AppError> {
    let levels = app_state.inventory_service.list_stock(&query).await?;
    Ok((StatusCode::OK, Json(levels)))
}

// ---
// Adjustments
// ---

#[utoipa::path(
    post,
    path = "/api/adjustments",
    tag = "Inventory",
    request_body = CreateAdjustmentPayload,
    responses(
        (status = 201, description = "Count applied to stock", body = StockAdjustment),
        (status = 400, description = "Invalid payload or inactive product/location"),
        (status = 404, description = "Product or location not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_adjustment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermAdjustmentsWrite>,
    AppJson(payload): AppJson<CreateAdjustmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let adjustment = app_state.inventory_service.create_adjustment(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(adjustment)))
}

#[utoipa::path(
    get,
    path = "/api/adjustments",
    tag = "Inventory",
    responses((status = 200, description = "Adjustments, newest first", body = Vec<StockAdjustment>)),
    security(("api_jwt" = []))
)]
pub async fn list_adjustments(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
) -> Result<impl IntoResponse, AppError> {
    let adjustments = app_state.inventory_service.list_adjustments().await?;
    Ok((StatusCode::OK, Json(adjustments)))
}

// ---
// Move history
// ---

#[utoipa::path(
    get,
    path = "/api/move-history",
    tag = "Inventory",
    params(MoveHistoryQuery),
    responses((status = 200, description = "Stock movements, newest first", body = Vec<MoveHistoryEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_move_history(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<MoveHistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let moves = app_state.inventory_service.list_moves(&query).await?;
    Ok((StatusCode::OK, Json(moves)))
}

// ---
// Low-stock alerts
// ---

#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "Inventory",
    params(AlertQuery),
    responses((status = 200, description = "Open (default) or resolved alerts", body = Vec<LowStockAlertEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_alerts(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<AlertQuery>,
) -> Result<impl IntoResponse, AppError> {
    let alerts = app_state.inventory_service.list_alerts(query.resolved).await?;
    Ok((StatusCode::OK, Json(alerts)))
}

#[utoipa::path(
    post,
    path = "/api/alerts/{id}/resolve",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert acknowledged", body = LowStockAlert),
        (status = 404, description = "Alert not found"),
        (status = 409, description = "Alert already resolved")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_alert(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermAlertsResolve>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let alert = app_state.inventory_service.resolve_alert(id).await?;
    Ok((StatusCode::OK, Json(alert)))
}
