// src/services/inventory_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::page_bounds, error::AppError},
    db::{
        CatalogRepository, InventoryRepository,
        inventory_repo::{NewMove, ReferenceSequence},
    },
    models::{
        auth::User,
        catalog::{Location, Product},
        inventory::{
            CreateAdjustmentPayload, LowStockAlert, LowStockAlertEntry, MoveHistoryEntry,
            MoveHistoryQuery, MoveType, Stock, StockAdjustment, StockLevel, StockQuery,
        },
    },
};

const DEFAULT_HISTORY_PAGE: i64 = 50;
const MAX_HISTORY_PAGE: i64 = 500;

/// What a stock change means for the (product, location) alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Raise,
    Resolve,
    Keep,
}

/// A pair is low when its product has a reorder level and the quantity sits
/// at or below it. Products without a reorder level never alert.
pub fn low_stock_action(quantity: Decimal, reorder_level: Decimal, has_open_alert: bool) -> AlertAction {
    let is_low = reorder_level > Decimal::ZERO && quantity <= reorder_level;
    match (is_low, has_open_alert) {
        (true, false) => AlertAction::Raise,
        (false, true) => AlertAction::Resolve,
        _ => AlertAction::Keep,
    }
}

/// The document a stock change belongs to, copied onto every move row.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub reference: &'a str,
    pub source_id: Uuid,
    pub performed_by: Uuid,
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    catalog_repo: CatalogRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, catalog_repo: CatalogRepository, pool: PgPool) -> Self {
        Self { inventory_repo, catalog_repo, pool }
    }

    pub(crate) fn repo(&self) -> &InventoryRepository {
        &self.inventory_repo
    }

    // ---
    // Lookups shared by every movement
    // ---

    pub(crate) async fn require_active_product(
        &self,
        conn: &mut PgConnection,
        product_id: Uuid,
    ) -> Result<Product, AppError> {
        let product = self
            .catalog_repo
            .find_product(&mut *conn, product_id)
            .await?
            .ok_or(AppError::NotFound("Product"))?;
        if !product.is_active {
            return Err(AppError::BadRequest(format!("Product {} is inactive.", product.sku)));
        }
        Ok(product)
    }

    pub(crate) async fn require_active_location(
        &self,
        conn: &mut PgConnection,
        location_id: Uuid,
    ) -> Result<Location, AppError> {
        let location = self
            .catalog_repo
            .find_location(&mut *conn, location_id)
            .await?
            .ok_or(AppError::NotFound("Location"))?;
        if !location.is_active {
            return Err(AppError::BadRequest(format!("Location {} is inactive.", location.code)));
        }
        Ok(location)
    }

    // ---
    // Stock mutations. Each one runs on the caller's transaction, writes its
    // move-history row and re-evaluates the low-stock alert.
    // ---

    pub(crate) async fn add_stock(
        &self,
        conn: &mut PgConnection,
        ctx: MoveContext<'_>,
        product: &Product,
        location_id: Uuid,
        quantity: Decimal,
        move_type: MoveType,
    ) -> Result<Stock, AppError> {
        let stock = self
            .inventory_repo
            .increase_stock(&mut *conn, product.id, location_id, quantity)
            .await?;

        self.record(&mut *conn, ctx, &stock, quantity, move_type).await?;
        self.evaluate_alert(&mut *conn, product, &stock).await?;
        Ok(stock)
    }

    /// Fails with `InsufficientStock` without touching anything when the
    /// location does not hold `quantity`.
    pub(crate) async fn remove_stock(
        &self,
        conn: &mut PgConnection,
        ctx: MoveContext<'_>,
        product: &Product,
        location_id: Uuid,
        quantity: Decimal,
        move_type: MoveType,
    ) -> Result<Stock, AppError> {
        let updated = self
            .inventory_repo
            .decrease_stock(&mut *conn, product.id, location_id, quantity)
            .await?;

        let stock = match updated {
            Some(stock) => stock,
            None => {
                let available = self
                    .inventory_repo
                    .current_quantity(&mut *conn, product.id, location_id)
                    .await?;
                tracing::warn!(
                    reference = ctx.reference,
                    sku = %product.sku,
                    %available,
                    requested = %quantity,
                    "Insufficient stock"
                );
                return Err(AppError::InsufficientStock {
                    sku: product.sku.clone(),
                    available,
                    requested: quantity,
                });
            }
        };

        self.record(&mut *conn, ctx, &stock, -quantity, move_type).await?;
        self.evaluate_alert(&mut *conn, product, &stock).await?;
        Ok(stock)
    }

    async fn record(
        &self,
        conn: &mut PgConnection,
        ctx: MoveContext<'_>,
        stock: &Stock,
        quantity_change: Decimal,
        move_type: MoveType,
    ) -> Result<(), AppError> {
        self.inventory_repo
            .record_move(
                &mut *conn,
                &NewMove {
                    product_id: stock.product_id,
                    location_id: stock.location_id,
                    move_type,
                    quantity_change,
                    quantity_after: stock.quantity,
                    reference: ctx.reference,
                    source_id: ctx.source_id,
                    performed_by: ctx.performed_by,
                },
            )
            .await?;
        Ok(())
    }

    async fn evaluate_alert(
        &self,
        conn: &mut PgConnection,
        product: &Product,
        stock: &Stock,
    ) -> Result<(), AppError> {
        let has_open = self
            .inventory_repo
            .has_open_alert(&mut *conn, stock.product_id, stock.location_id)
            .await?;

        match low_stock_action(stock.quantity, product.reorder_level, has_open) {
            AlertAction::Raise => {
                let raised = self
                    .inventory_repo
                    .open_alert(
                        &mut *conn,
                        stock.product_id,
                        stock.location_id,
                        stock.quantity,
                        product.reorder_level,
                    )
                    .await?;
                if raised.is_some() {
                    tracing::warn!(
                        sku = %product.sku,
                        location_id = %stock.location_id,
                        quantity = %stock.quantity,
                        reorder_level = %product.reorder_level,
                        "⚠️ Low stock"
                    );
                }
            }
            AlertAction::Resolve => {
                self.inventory_repo
                    .resolve_open_alerts(&mut *conn, stock.product_id, stock.location_id)
                    .await?;
                tracing::info!(sku = %product.sku, location_id = %stock.location_id, "Low-stock alert cleared");
            }
            AlertAction::Keep => {}
        }
        Ok(())
    }

    // ---
    // Adjustments (physical count applied immediately)
    // ---

    pub async fn create_adjustment(
        &self,
        user: &User,
        payload: &CreateAdjustmentPayload,
    ) -> Result<StockAdjustment, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self.require_active_product(&mut *tx, payload.product_id).await?;
        self.require_active_location(&mut *tx, payload.location_id).await?;

        let previous = self
            .inventory_repo
            .lock_stock(&mut *tx, product.id, payload.location_id)
            .await?
            .map(|s| s.quantity)
            .unwrap_or(Decimal::ZERO);

        let reference = self
            .inventory_repo
            .next_reference(&mut *tx, ReferenceSequence::Adjustment)
            .await?;

        let adjustment = self
            .inventory_repo
            .create_adjustment(
                &mut *tx,
                &reference,
                product.id,
                payload.location_id,
                previous,
                payload.counted_quantity,
                payload.reason.trim(),
                user.id,
            )
            .await?;

        let stock = self
            .inventory_repo
            .set_stock(&mut *tx, product.id, payload.location_id, payload.counted_quantity)
            .await?;

        let ctx = MoveContext { reference: &reference, source_id: adjustment.id, performed_by: user.id };
        self.record(&mut *tx, ctx, &stock, adjustment.difference, MoveType::Adjustment).await?;
        self.evaluate_alert(&mut *tx, &product, &stock).await?;

        tx.commit().await?;

        tracing::info!(
            %reference,
            sku = %product.sku,
            previous = %previous,
            counted = %payload.counted_quantity,
            "📝 Stock adjusted"
        );
        Ok(adjustment)
    }

    pub async fn list_adjustments(&self) -> Result<Vec<StockAdjustment>, AppError> {
        self.inventory_repo.list_adjustments().await
    }

    // ---
    // Read side
    // ---

    pub async fn list_stock(&self, query: &StockQuery) -> Result<Vec<StockLevel>, AppError> {
        self.inventory_repo.list_stock(query).await
    }

    pub async fn list_moves(&self, query: &MoveHistoryQuery) -> Result<Vec<MoveHistoryEntry>, AppError> {
        let (limit, offset) = page_bounds(query.limit, query.offset, DEFAULT_HISTORY_PAGE, MAX_HISTORY_PAGE);
        self.inventory_repo
            .list_moves(query.product_id, query.location_id, query.move_type, limit, offset)
            .await
    }

    pub async fn list_alerts(&self, resolved: bool) -> Result<Vec<LowStockAlertEntry>, AppError> {
        self.inventory_repo.list_alerts(resolved).await
    }

    /// Manual acknowledgement. A new alert is raised on the next mutation
    /// that leaves the pair low.
    pub async fn resolve_alert(&self, id: Uuid) -> Result<LowStockAlert, AppError> {
        if let Some(alert) = self.inventory_repo.resolve_alert(id).await? {
            tracing::info!(alert_id = %alert.id, "Low-stock alert acknowledged");
            return Ok(alert);
        }

        match self.inventory_repo.find_alert(id).await? {
            Some(_) => Err(AppError::Conflict("Alert is already resolved.".into())),
            None => Err(AppError::NotFound("Alert")),
        }
    }
}
