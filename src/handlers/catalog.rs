// src/handlers/catalog.rs

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
    middleware::rbac::{PermCatalogDelete, PermCatalogWrite, PermRead, RequirePermission},
    models::{
        catalog::{
            CatalogQuery, CreateLocationPayload, CreateProductPayload, CreateVendorPayload,
            DeleteResponse, Location, Product, UpdateLocationPayload, UpdateProductPayload,
            UpdateVendorPayload, Vendor,
        },
        inventory::StockLevel,
    },
};

// =============================================================================
//  PRODUCTS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(CatalogQuery),
    responses((status = 200, description = "Products", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(&query).await?;
    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 409, description = "SKU already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppJson(payload): AppJson<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state.catalog_service.create_product(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Product not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Product not found"),
        (status = 409, description = "SKU already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state.catalog_service.update_product(id, &payload).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Deleted, or deactivated when still referenced", body = DeleteResponse),
        (status = 404, description = "Product not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogDelete>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.catalog_service.delete_product(id).await?;
    Ok((StatusCode::OK, Json(DeleteResponse { id, outcome })))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/stock",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "On-hand quantity per location", body = Vec<StockLevel>),
        (status = 404, description = "Product not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product_stock(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let levels = app_state.catalog_service.product_stock(id).await?;
    Ok((StatusCode::OK, Json(levels)))
}

// =============================================================================
//  LOCATIONS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Catalog",
    params(CatalogQuery),
    responses((status = 200, description = "Locations", body = Vec<Location>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let locations = app_state.catalog_service.list_locations(&query).await?;
    Ok((StatusCode::OK, Json(locations)))
}

#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Catalog",
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Location created", body = Location),
        (status = 409, description = "Code already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppJson(payload): AppJson<CreateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let location = app_state.catalog_service.create_location(&payload).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = Location),
        (status = 404, description = "Location not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let location = app_state.catalog_service.get_location(id).await?;
    Ok((StatusCode::OK, Json(location)))
}

#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = UpdateLocationPayload,
    responses(
        (status = 200, description = "Location updated", body = Location),
        (status = 404, description = "Location not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let location = app_state.catalog_service.update_location(id, &payload).await?;
    Ok((StatusCode::OK, Json(location)))
}

#[utoipa::path(
    delete,
    path = "/api/locations/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Deleted, or deactivated when still referenced", body = DeleteResponse),
        (status = 404, description = "Location not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_location(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogDelete>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.catalog_service.delete_location(id).await?;
    Ok((StatusCode::OK, Json(DeleteResponse { id, outcome })))
}

// =============================================================================
//  VENDORS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/vendors",
    tag = "Catalog",
    params(CatalogQuery),
    responses((status = 200, description = "Vendors", body = Vec<Vendor>)),
    security(("api_jwt" = []))
)]
pub async fn list_vendors(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppQuery(query): AppQuery<CatalogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let vendors = app_state.catalog_service.list_vendors(&query).await?;
    Ok((StatusCode::OK, Json(vendors)))
}

#[utoipa::path(
    post,
    path = "/api/vendors",
    tag = "Catalog",
    request_body = CreateVendorPayload,
    responses(
        (status = 201, description = "Vendor created", body = Vendor),
        (status = 409, description = "Name already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vendor(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppJson(payload): AppJson<CreateVendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let vendor = app_state.catalog_service.create_vendor(&payload).await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

#[utoipa::path(
    get,
    path = "/api/vendors/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor", body = Vendor),
        (status = 404, description = "Vendor not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vendor(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermRead>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = app_state.catalog_service.get_vendor(id).await?;
    Ok((StatusCode::OK, Json(vendor)))
}

#[utoipa::path(
    put,
    path = "/api/vendors/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = UpdateVendorPayload,
    responses(
        (status = 200, description = "Vendor updated", body = Vendor),
        (status = 404, description = "Vendor not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vendor(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogWrite>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateVendorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let vendor = app_state.catalog_service.update_vendor(id, &payload).await?;
    Ok((StatusCode::OK, Json(vendor)))
}

#[utoipa::path(
    delete,
    path = "/api/vendors/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Deleted, or deactivated when still referenced", body = DeleteResponse),
        (status = 404, description = "Vendor not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vendor(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermCatalogDelete>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.catalog_service.delete_vendor(id).await?;
    Ok((StatusCode::OK, Json(DeleteResponse { id, outcome })))
}
