// src/app.rs

use axum::{
    Json, Router,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Builds the full HTTP surface: public auth routes, everything else behind
/// the bearer-token guard, plus Swagger UI.
pub fn build_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::users::get_me))
        .route("/{id}/role", patch(handlers::users::update_user_role))
        .route("/{id}/status", patch(handlers::users::update_user_status));

    let catalog_routes = Router::new()
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route("/products/{id}/stock", get(handlers::catalog::get_product_stock))
        .route(
            "/locations",
            get(handlers::catalog::list_locations).post(handlers::catalog::create_location),
        )
        .route(
            "/locations/{id}",
            get(handlers::catalog::get_location)
                .put(handlers::catalog::update_location)
                .delete(handlers::catalog::delete_location),
        )
        .route(
            "/vendors",
            get(handlers::catalog::list_vendors).post(handlers::catalog::create_vendor),
        )
        .route(
            "/vendors/{id}",
            get(handlers::catalog::get_vendor)
                .put(handlers::catalog::update_vendor)
                .delete(handlers::catalog::delete_vendor),
        );

    let inventory_routes = Router::new()
        .route("/stock", get(handlers::inventory::list_stock))
        .route(
            "/adjustments",
            get(handlers::inventory::list_adjustments).post(handlers::inventory::create_adjustment),
        )
        .route("/move-history", get(handlers::inventory::list_move_history))
        .route("/alerts", get(handlers::inventory::list_alerts))
        .route("/alerts/{id}/resolve", post(handlers::inventory::resolve_alert))
        .route("/dashboard/summary", get(handlers::dashboard::get_summary));

    let operation_routes = Router::new()
        .route(
            "/receipts",
            get(handlers::operations::list_receipts).post(handlers::operations::create_receipt),
        )
        .route("/receipts/{id}", get(handlers::operations::get_receipt))
        .route("/receipts/{id}/validate", post(handlers::operations::validate_receipt))
        .route("/receipts/{id}/cancel", post(handlers::operations::cancel_receipt))
        .route(
            "/deliveries",
            get(handlers::operations::list_deliveries).post(handlers::operations::create_delivery),
        )
        .route("/deliveries/{id}", get(handlers::operations::get_delivery))
        .route("/deliveries/{id}/validate", post(handlers::operations::validate_delivery))
        .route("/deliveries/{id}/cancel", post(handlers::operations::cancel_delivery))
        .route(
            "/transfers",
            get(handlers::operations::list_transfers).post(handlers::operations::create_transfer),
        )
        .route("/transfers/{id}", get(handlers::operations::get_transfer))
        .route("/transfers/{id}/validate", post(handlers::operations::validate_transfer))
        .route("/transfers/{id}/cancel", post(handlers::operations::cancel_transfer));

    // Everything past this point needs a valid token.
    let protected = Router::new()
        .nest("/users", user_routes)
        .merge(catalog_routes)
        .merge(inventory_routes)
        .merge(operation_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/auth", auth_routes)
        .merge(protected);

    let cors = cors_layer(app_state.config.cors_allowed_origin.as_deref());

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(Err(_)) => {
            tracing::warn!("CORS_ALLOWED_ORIGIN is not a valid header value, allowing any origin");
            CorsLayer::permissive()
        }
        None => CorsLayer::permissive(),
    }
}
