// src/handlers/operations.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        extract::{AppJson, AppPath, AppQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermOperationsCreate, PermOperationsValidate, PermRead, RequirePermission},
    },
    models::operations::{
        CreateDeliveryPayload, CreateReceiptPayload, CreateTransferPayload, DeliveryDetail,
        DeliveryOrder, DocumentQuery, InternalTransfer, ReceiptDetail, ReceiptOrder,
    },
};

// =============================================================================
//  RECEIPTS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/receipts",
    tag = "Operations",
    request_body = CreateReceiptPayload,
    responses(
        (status = 201, description = "Receipt drafted", body = ReceiptDetail),
        (status = 400, description = "Invalid payload or inactive vendor/location/product"),
        (status = 404, description = "Vendor, location or product not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_receipt(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsCreate>,
    AppJson(payload): AppJson<CreateReceiptPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let receipt = app_state.operations_service.create_receipt(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    get,
    path = "/api/receipts",
    tag = "Operations",
    params(DocumentQuery),
    responses((status = 200, description = "Receipts, newest first", body = Vec<ReceiptOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_receipts(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<DocumentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let receipts = app_state.operations_service.list_receipts(query.status).await?;
    Ok((StatusCode::OK, Json(receipts)))
}

#[utoipa::path(
    get,
    path = "/api/receipts/{id}",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Receipt id")),
    responses(
        (status = 200, description = "Receipt with its lines", body = ReceiptDetail),
        (status = 404, description = "Receipt not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_receipt(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state.operations_service.get_receipt(id).await?;
    Ok((StatusCode::OK, Json(receipt)))
}

#[utoipa::path(
    post,
    path = "/api/receipts/{id}/validate",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Receipt id")),
    responses(
        (status = 200, description = "Goods received into stock", body = ReceiptDetail),
        (status = 404, description = "Receipt not found"),
        (status = 409, description = "Receipt is not a draft")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_receipt(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state.operations_service.validate_receipt(&user, id).await?;
    Ok((StatusCode::OK, Json(receipt)))
}

#[utoipa::path(
    post,
    path = "/api/receipts/{id}/cancel",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Receipt id")),
    responses(
        (status = 200, description = "Receipt canceled", body = ReceiptOrder),
        (status = 404, description = "Receipt not found"),
        (status = 409, description = "Receipt is not a draft")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_receipt(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = app_state.operations_service.cancel_receipt(id).await?;
    Ok((StatusCode::OK, Json(receipt)))
}

// =============================================================================
//  DELIVERIES
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/deliveries",
    tag = "Operations",
    request_body = CreateDeliveryPayload,
    responses(
        (status = 201, description = "Delivery drafted", body = DeliveryDetail),
        (status = 400, description = "Invalid payload or inactive location/product"),
        (status = 404, description = "Location or product not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_delivery(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsCreate>,
    AppJson(payload): AppJson<CreateDeliveryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let delivery = app_state.operations_service.create_delivery(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

#[utoipa::path(
    get,
    path = "/api/deliveries",
    tag = "Operations",
    params(DocumentQuery),
    responses((status = 200, description = "Deliveries, newest first", body = Vec<DeliveryOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_deliveries(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<DocumentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let deliveries = app_state.operations_service.list_deliveries(query.status).await?;
    Ok((StatusCode::OK, Json(deliveries)))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Delivery id")),
    responses(
        (status = 200, description = "Delivery with its lines", body = DeliveryDetail),
        (status = 404, description = "Delivery not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_delivery(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let delivery = app_state.operations_service.get_delivery(id).await?;
    Ok((StatusCode::OK, Json(delivery)))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/validate",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Delivery id")),
    responses(
        (status = 200, description = "Goods shipped out of stock", body = DeliveryDetail),
        (status = 404, description = "Delivery not found"),
        (status = 409, description = "Not a draft, or a line lacks stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_delivery(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let delivery = app_state.operations_service.validate_delivery(&user, id).await?;
    Ok((StatusCode::OK, Json(delivery)))
}

#[utoipa::path(
    post,
    path = "/api/deliveries/{id}/cancel",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Delivery id")),
    responses(
        (status = 200, description = "Delivery canceled", body = DeliveryOrder),
        (status = 404, description = "Delivery not found"),
        (status = 409, description = "Delivery is not a draft")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_delivery(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let delivery = app_state.operations_service.cancel_delivery(id).await?;
    Ok((StatusCode::OK, Json(delivery)))
}

// =============================================================================
//  INTERNAL TRANSFERS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Operations",
    request_body = CreateTransferPayload,
    responses(
        (status = 201, description = "Transfer drafted", body = InternalTransfer),
        (status = 400, description = "Invalid payload or same source and destination"),
        (status = 404, description = "Product or location not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transfer(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsCreate>,
    AppJson(payload): AppJson<CreateTransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.validate_consistency().map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("toLocationId", e);
        AppError::ValidationError(errors)
    })?;

    let transfer = app_state.operations_service.create_transfer(&user, &payload).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "Operations",
    params(DocumentQuery),
    responses((status = 200, description = "Transfers, newest first", body = Vec<InternalTransfer>)),
    security(("api_jwt" = []))
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<DocumentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state.operations_service.list_transfers(query.status).await?;
    Ok((StatusCode::OK, Json(transfers)))
}

#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer", body = InternalTransfer),
        (status = 404, description = "Transfer not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_transfer(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state.operations_service.get_transfer(id).await?;
    Ok((StatusCode::OK, Json(transfer)))
}

#[utoipa::path(
    post,
    path = "/api/transfers/{id}/validate",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Stock moved between locations", body = InternalTransfer),
        (status = 404, description = "Transfer not found"),
        (status = 409, description = "Not a draft, or the source lacks stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn validate_transfer(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state.operations_service.validate_transfer(&user, id).await?;
    Ok((StatusCode::OK, Json(transfer)))
}

#[utoipa::path(
    post,
    path = "/api/transfers/{id}/cancel",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer canceled", body = InternalTransfer),
        (status = 404, description = "Transfer not found"),
        (status = 409, description = "Transfer is not a draft")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_transfer(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermOperationsValidate>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state.operations_service.cancel_transfer(id).await?;
    Ok((StatusCode::OK, Json(transfer)))
}
