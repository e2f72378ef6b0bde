// End-to-end stock flows against a real database. Each test gets a fresh,
// migrated database from `#[sqlx::test]` (needs DATABASE_URL).

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use stockmaster::{
    app::build_router,
    common::error::AppError,
    config::{AppState, Config},
    models::{
        auth::{Role, User},
        catalog::{
            CreateLocationPayload, CreateProductPayload, CreateVendorPayload, Location, Product,
            UpdateVendorPayload, Vendor,
        },
        inventory::{CreateAdjustmentPayload, MoveHistoryQuery, MoveType, StockQuery},
        operations::{
            CreateDeliveryPayload, CreateReceiptPayload, CreateTransferPayload, DocumentLinePayload,
            DocumentStatus,
        },
    },
};

struct Fixture {
    state: AppState,
    admin: User,
    staff_token: String,
    bolt: Product,
    nut: Product,
    main: Location,
    annex: Location,
    vendor: Vendor,
}

async fn fixture(pool: PgPool) -> Fixture {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "JWT_SECRET" => Some("flow-test-secret-0123456789".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::from_pool(config, pool);

    let (_, admin) = state
        .auth_service
        .register_user("Ada Admin", "ada@stockmaster.io", "long-enough-pass")
        .await
        .unwrap();
    let (staff_token, staff) = state
        .auth_service
        .register_user("Sam Staff", "sam@stockmaster.io", "long-enough-pass")
        .await
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(staff.role, Role::Staff);

    let catalog = &state.catalog_service;
    let bolt = catalog
        .create_product(&CreateProductPayload {
            sku: "BLT-10".into(),
            name: "Bolt 10mm".into(),
            category: Some("Fasteners".into()),
            unit_of_measure: None,
            description: None,
            reorder_level: dec!(5),
        })
        .await
        .unwrap();
    let nut = catalog
        .create_product(&CreateProductPayload {
            sku: "NUT-10".into(),
            name: "Nut 10mm".into(),
            category: None,
            unit_of_measure: None,
            description: None,
            reorder_level: Decimal::ZERO,
        })
        .await
        .unwrap();
    let main = catalog
        .create_location(&CreateLocationPayload { code: "WH-MAIN".into(), name: "Main".into(), address: None })
        .await
        .unwrap();
    let annex = catalog
        .create_location(&CreateLocationPayload { code: "WH-ANNEX".into(), name: "Annex".into(), address: None })
        .await
        .unwrap();
    let vendor = catalog
        .create_vendor(&CreateVendorPayload {
            name: "Acme Metals".into(),
            email: Some("sales@acme.test".into()),
            phone: Some("555-0100".into()),
            address: None,
        })
        .await
        .unwrap();

    Fixture { state, admin, staff_token, bolt, nut, main, annex, vendor }
}

fn line(product: &Product, quantity: Decimal) -> DocumentLinePayload {
    DocumentLinePayload { product_id: product.id, quantity }
}

async fn on_hand(state: &AppState, product: &Product, location: &Location) -> Decimal {
    let query = StockQuery {
        product_id: Some(product.id),
        location_id: Some(location.id),
        ..Default::default()
    };
    let levels = state.inventory_service.list_stock(&query).await.unwrap();
    levels.first().map(|s| s.quantity).unwrap_or(Decimal::ZERO)
}

async fn moves_for(state: &AppState, product: &Product) -> Vec<(MoveType, Uuid, Decimal)> {
    let query = MoveHistoryQuery { product_id: Some(product.id), ..Default::default() };
    state
        .inventory_service
        .list_moves(&query)
        .await
        .unwrap()
        .into_iter()
        .map(|e| (e.movement.move_type, e.movement.location_id, e.movement.quantity_change))
        .collect()
}

async fn open_alerts(state: &AppState, product: &Product, location: &Location) -> Vec<Uuid> {
    state
        .inventory_service
        .list_alerts(false)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.alert.product_id == product.id && e.alert.location_id == location.id)
        .map(|e| e.alert.id)
        .collect()
}

async fn receive(f: &Fixture, location: &Location, lines: Vec<DocumentLinePayload>) -> Result<Uuid, AppError> {
    let ops = &f.state.operations_service;
    let receipt = ops
        .create_receipt(
            &f.admin,
            &CreateReceiptPayload {
                vendor_id: f.vendor.id,
                location_id: location.id,
                scheduled_date: None,
                notes: None,
                items: lines,
            },
        )
        .await?;
    ops.validate_receipt(&f.admin, receipt.receipt.id).await?;
    Ok(receipt.receipt.id)
}

async fn deliver(f: &Fixture, location: &Location, lines: Vec<DocumentLinePayload>) -> Result<Uuid, AppError> {
    let ops = &f.state.operations_service;
    let delivery = ops
        .create_delivery(
            &f.admin,
            &CreateDeliveryPayload {
                customer_name: "Globex".into(),
                location_id: location.id,
                scheduled_date: None,
                notes: None,
                items: lines,
            },
        )
        .await?;
    ops.validate_delivery(&f.admin, delivery.delivery.id).await?;
    Ok(delivery.delivery.id)
}

async fn transfer(f: &Fixture, from: &Location, to: &Location, quantity: Decimal) -> Result<Uuid, AppError> {
    let ops = &f.state.operations_service;
    let draft = ops
        .create_transfer(
            &f.admin,
            &CreateTransferPayload {
                product_id: f.bolt.id,
                from_location_id: from.id,
                to_location_id: to.id,
                quantity,
                notes: None,
            },
        )
        .await?;
    ops.validate_transfer(&f.admin, draft.id).await?;
    Ok(draft.id)
}

#[sqlx::test]
async fn receipt_delivery_transfer_adjustment_flow(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;

    let receipt_id = receive(&f, &f.main, vec![line(&f.bolt, dec!(10)), line(&f.nut, dec!(1))])
        .await
        .unwrap();
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(10));
    assert_eq!(on_hand(state, &f.nut, &f.main).await, dec!(1));

    // A second validation is refused and changes nothing.
    let again = state.operations_service.validate_receipt(&f.admin, receipt_id).await;
    assert!(matches!(again, Err(AppError::InvalidStatus { .. })));
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(10));
    let receipt = state.operations_service.get_receipt(receipt_id).await.unwrap();
    assert_eq!(receipt.receipt.status, DocumentStatus::Done);

    deliver(&f, &f.main, vec![line(&f.bolt, dec!(6))]).await.unwrap();
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(4));

    transfer(&f, &f.main, &f.annex, dec!(1)).await.unwrap();
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(3));
    assert_eq!(on_hand(state, &f.bolt, &f.annex).await, dec!(1));

    let adjustment = state
        .inventory_service
        .create_adjustment(
            &f.admin,
            &CreateAdjustmentPayload {
                product_id: f.bolt.id,
                location_id: f.main.id,
                counted_quantity: dec!(20),
                reason: "  Cycle count  ".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(adjustment.previous_quantity, dec!(3));
    assert_eq!(adjustment.difference, dec!(17));
    assert_eq!(adjustment.reason, "Cycle count");
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(20));

    // One row per stock change, newest first; the transfer's two rows keep
    // their write order.
    let moves = moves_for(state, &f.bolt).await;
    let kinds: Vec<MoveType> = moves.iter().map(|m| m.0).collect();
    assert_eq!(
        kinds,
        vec![
            MoveType::Adjustment,
            MoveType::TransferIn,
            MoveType::TransferOut,
            MoveType::Delivery,
            MoveType::Receipt,
        ]
    );
    assert_eq!(moves[1].1, f.annex.id);
    assert_eq!(moves[2], (MoveType::TransferOut, f.main.id, dec!(-1)));
}

#[sqlx::test]
async fn failed_delivery_rolls_back_every_line(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;
    receive(&f, &f.main, vec![line(&f.bolt, dec!(10)), line(&f.nut, dec!(1))])
        .await
        .unwrap();
    let moves_before = moves_for(state, &f.bolt).await.len() + moves_for(state, &f.nut).await.len();

    let result = deliver(&f, &f.main, vec![line(&f.bolt, dec!(3)), line(&f.nut, dec!(5))]).await;
    match result {
        Err(AppError::InsufficientStock { sku, available, requested }) => {
            assert_eq!(sku, "NUT-10");
            assert_eq!(available, dec!(1));
            assert_eq!(requested, dec!(5));
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(10));
    assert_eq!(on_hand(state, &f.nut, &f.main).await, dec!(1));
    let moves_after = moves_for(state, &f.bolt).await.len() + moves_for(state, &f.nut).await.len();
    assert_eq!(moves_before, moves_after);

    let drafts = state
        .operations_service
        .list_deliveries(Some(DocumentStatus::Draft))
        .await
        .unwrap();
    assert_eq!(drafts.len(), 1);
}

#[sqlx::test]
async fn stock_never_goes_negative(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;
    receive(&f, &f.main, vec![line(&f.bolt, dec!(2))]).await.unwrap();

    let result = transfer(&f, &f.main, &f.annex, dec!(2.5)).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, dec!(2));
    assert_eq!(on_hand(state, &f.bolt, &f.annex).await, Decimal::ZERO);

    // Delivering from a pair that has never been stocked.
    let result = deliver(&f, &f.annex, vec![line(&f.bolt, dec!(1))]).await;
    assert!(matches!(result, Err(AppError::InsufficientStock { .. })));

    deliver(&f, &f.main, vec![line(&f.bolt, dec!(2))]).await.unwrap();
    assert_eq!(on_hand(state, &f.bolt, &f.main).await, Decimal::ZERO);
}

#[sqlx::test]
async fn low_stock_alert_is_raised_once_and_resolved_by_restock(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;

    receive(&f, &f.main, vec![line(&f.bolt, dec!(10))]).await.unwrap();
    assert!(open_alerts(state, &f.bolt, &f.main).await.is_empty());

    deliver(&f, &f.main, vec![line(&f.bolt, dec!(5))]).await.unwrap();
    let raised = open_alerts(state, &f.bolt, &f.main).await;
    assert_eq!(raised.len(), 1);

    // Still low: the same alert stays open, no duplicate.
    deliver(&f, &f.main, vec![line(&f.bolt, dec!(2))]).await.unwrap();
    assert_eq!(open_alerts(state, &f.bolt, &f.main).await, raised);

    // Products without a reorder level never alert.
    receive(&f, &f.main, vec![line(&f.nut, dec!(1))]).await.unwrap();
    assert!(open_alerts(state, &f.nut, &f.main).await.is_empty());

    receive(&f, &f.main, vec![line(&f.bolt, dec!(10))]).await.unwrap();
    assert!(open_alerts(state, &f.bolt, &f.main).await.is_empty());
    let resolved = state.inventory_service.list_alerts(true).await.unwrap();
    assert!(resolved.iter().any(|e| e.alert.id == raised[0] && e.alert.resolved_at.is_some()));
}

#[sqlx::test]
async fn manual_resolve_acknowledges_an_open_alert(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;
    receive(&f, &f.main, vec![line(&f.bolt, dec!(3))]).await.unwrap();

    let open = open_alerts(state, &f.bolt, &f.main).await;
    assert_eq!(open.len(), 1);

    let alert = state.inventory_service.resolve_alert(open[0]).await.unwrap();
    assert!(alert.is_resolved);
    assert!(matches!(state.inventory_service.resolve_alert(open[0]).await, Err(AppError::Conflict(_))));
    assert!(matches!(
        state.inventory_service.resolve_alert(Uuid::new_v4()).await,
        Err(AppError::NotFound("Alert"))
    ));

    // The next change that leaves the pair low raises a fresh one.
    deliver(&f, &f.main, vec![line(&f.bolt, dec!(1))]).await.unwrap();
    let reopened = open_alerts(state, &f.bolt, &f.main).await;
    assert_eq!(reopened.len(), 1);
    assert_ne!(reopened[0], open[0]);
}

#[sqlx::test]
async fn stock_overflow_is_a_client_error(pool: PgPool) {
    let f = fixture(pool).await;
    let state = &f.state;
    let near_max = dec!(90000000000000);
    receive(&f, &f.main, vec![line(&f.nut, near_max)]).await.unwrap();

    let result = receive(&f, &f.main, vec![line(&f.nut, near_max)]).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))), "{result:?}");
    assert_eq!(on_hand(state, &f.nut, &f.main).await, near_max);
}

#[sqlx::test]
async fn explicit_null_clears_vendor_contact_fields(pool: PgPool) {
    let f = fixture(pool).await;
    let catalog = &f.state.catalog_service;

    let keep: UpdateVendorPayload = serde_json::from_value(json!({ "name": "Acme Metals Ltd" })).unwrap();
    let vendor = catalog.update_vendor(f.vendor.id, &keep).await.unwrap();
    assert_eq!(vendor.name, "Acme Metals Ltd");
    assert_eq!(vendor.phone.as_deref(), Some("555-0100"));

    let clear: UpdateVendorPayload = serde_json::from_value(json!({ "phone": null, "email": null })).unwrap();
    let vendor = catalog.update_vendor(f.vendor.id, &clear).await.unwrap();
    assert_eq!(vendor.phone, None);
    assert_eq!(vendor.email, None);
    assert_eq!(vendor.name, "Acme Metals Ltd");
}

// ---
// Through the router
// ---

async fn call(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[sqlx::test]
async fn staff_cannot_write_the_catalog_or_validate(pool: PgPool) {
    let f = fixture(pool).await;
    let bearer = format!("Bearer {}", f.staff_token);

    let create = Request::post("/api/products")
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "sku": "X-1", "name": "Washer" }).to_string()))
        .unwrap();
    let (status, body) = call(&f.state, create).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    // Staff may draft a receipt but not validate it.
    let draft = Request::post("/api/receipts")
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "vendorId": f.vendor.id,
                "locationId": f.main.id,
                "items": [{ "productId": f.bolt.id, "quantity": 4 }]
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = call(&f.state, draft).await;
    assert_eq!(status, StatusCode::CREATED);
    let receipt_id = body["id"].as_str().unwrap().to_string();

    let validate = Request::post(format!("/api/receipts/{receipt_id}/validate"))
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&f.state, validate).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(on_hand(&f.state, &f.bolt, &f.main).await, Decimal::ZERO);
}

#[sqlx::test]
async fn malformed_path_and_quantity_get_json_bad_requests(pool: PgPool) {
    let f = fixture(pool).await;
    let bearer = format!("Bearer {}", f.staff_token);

    let bad_id = Request::get("/api/products/not-a-uuid")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&f.state, bad_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let too_precise = Request::post("/api/receipts")
        .header(header::AUTHORIZATION, &bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "vendorId": f.vendor.id,
                "locationId": f.main.id,
                "items": [{ "productId": f.bolt.id, "quantity": 0.00001 }]
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = call(&f.state, too_precise).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].is_object());
}
