// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::inventory::{
        LowStockAlert, LowStockAlertEntry, MoveHistory, MoveHistoryEntry, MoveType, Stock,
        StockAdjustment, StockLevel, StockQuery,
    },
};

/// One audit row, written in the same transaction as the stock change it describes.
#[derive(Debug, Clone)]
pub struct NewMove<'a> {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub move_type: MoveType,
    pub quantity_change: Decimal,
    pub quantity_after: Decimal,
    pub reference: &'a str,
    pub source_id: Uuid,
    pub performed_by: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSequence {
    Receipt,
    Delivery,
    Transfer,
    Adjustment,
}

impl ReferenceSequence {
    fn sequence_name(self) -> &'static str {
        match self {
            ReferenceSequence::Receipt => "receipt_reference_seq",
            ReferenceSequence::Delivery => "delivery_reference_seq",
            ReferenceSequence::Transfer => "transfer_reference_seq",
            ReferenceSequence::Adjustment => "adjustment_reference_seq",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            ReferenceSequence::Receipt => "WH/IN",
            ReferenceSequence::Delivery => "WH/OUT",
            ReferenceSequence::Transfer => "WH/INT",
            ReferenceSequence::Adjustment => "WH/ADJ",
        }
    }

    /// `WH/IN/00042`
    pub fn format(self, value: i64) -> String {
        format!("{}/{:05}", self.prefix(), value)
    }
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn next_reference<'e, E>(
        &self,
        executor: E,
        sequence: ReferenceSequence,
    ) -> Result<String, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value = sqlx::query_scalar::<_, i64>("SELECT nextval($1::regclass)")
            .bind(sequence.sequence_name())
            .fetch_one(executor)
            .await?;
        Ok(sequence.format(value))
    }

    // ---
    // Stock rows
    // ---

    /// Locks the (product, location) row until the transaction ends.
    pub async fn lock_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<Stock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            SELECT * FROM stock
            WHERE product_id = $1 AND location_id = $2
            FOR UPDATE
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(executor)
        .await?;
        Ok(stock)
    }

    /// Creates the row on first receipt; otherwise adds to it.
    pub async fn increase_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
        quantity: Decimal,
    ) -> Result<Stock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            INSERT INTO stock (product_id, location_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, location_id)
            DO UPDATE SET
                quantity = stock.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(quantity)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The stock level"))?;
        Ok(stock)
    }

    /// Conditional decrement: returns `None` when the pair has no row or not
    /// enough quantity, leaving stock untouched.
    pub async fn decrease_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
        quantity: Decimal,
    ) -> Result<Option<Stock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            UPDATE stock
            SET quantity = quantity - $3, updated_at = NOW()
            WHERE product_id = $1 AND location_id = $2 AND quantity >= $3
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(stock)
    }

    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
        quantity: Decimal,
    ) -> Result<Stock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, Stock>(
            r#"
            INSERT INTO stock (product_id, location_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, location_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(quantity)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The stock level"))?;
        Ok(stock)
    }

    pub async fn current_quantity<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE((SELECT quantity FROM stock WHERE product_id = $1 AND location_id = $2), 0)",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(executor)
        .await?;
        Ok(quantity)
    }

    pub async fn list_stock(&self, query: &StockQuery) -> Result<Vec<StockLevel>, AppError> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT
                s.product_id,
                p.sku AS product_sku,
                p.name AS product_name,
                p.unit_of_measure,
                s.location_id,
                l.code AS location_code,
                l.name AS location_name,
                s.quantity,
                p.reorder_level,
                (p.reorder_level > 0 AND s.quantity <= p.reorder_level) AS is_low_stock,
                s.updated_at
            FROM stock s
            JOIN products p ON p.id = s.product_id
            JOIN locations l ON l.id = s.location_id
            WHERE ($1::uuid IS NULL OR s.product_id = $1)
              AND ($2::uuid IS NULL OR s.location_id = $2)
              AND (NOT $3 OR (p.reorder_level > 0 AND s.quantity <= p.reorder_level))
            ORDER BY p.name ASC, l.code ASC
            "#,
        )
        .bind(query.product_id)
        .bind(query.location_id)
        .bind(query.low_stock_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }

    // ---
    // Move history
    // ---

    pub async fn record_move<'e, E>(&self, executor: E, entry: &NewMove<'_>) -> Result<MoveHistory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, MoveHistory>(
            r#"
            INSERT INTO move_history (
                product_id, location_id, move_type, quantity_change,
                quantity_after, reference, source_id, performed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(entry.product_id)
        .bind(entry.location_id)
        .bind(entry.move_type)
        .bind(entry.quantity_change)
        .bind(entry.quantity_after)
        .bind(entry.reference)
        .bind(entry.source_id)
        .bind(entry.performed_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The move"))?;
        Ok(movement)
    }

    pub async fn list_moves(
        &self,
        product_id: Option<Uuid>,
        location_id: Option<Uuid>,
        move_type: Option<MoveType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MoveHistoryEntry>, AppError> {
        let moves = sqlx::query_as::<_, MoveHistoryEntry>(
            r#"
            SELECT
                m.*,
                p.sku AS product_sku,
                l.code AS location_code,
                u.name AS performed_by_name
            FROM move_history m
            JOIN products p ON p.id = m.product_id
            JOIN locations l ON l.id = m.location_id
            JOIN users u ON u.id = m.performed_by
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
              AND ($2::uuid IS NULL OR m.location_id = $2)
              AND ($3::move_type IS NULL OR m.move_type = $3)
            ORDER BY m.seq DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(move_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(moves)
    }

    // ---
    // Adjustments
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_adjustment<'e, E>(
        &self,
        executor: E,
        reference: &str,
        product_id: Uuid,
        location_id: Uuid,
        previous_quantity: Decimal,
        counted_quantity: Decimal,
        reason: &str,
        created_by: Uuid,
    ) -> Result<StockAdjustment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let adjustment = sqlx::query_as::<_, StockAdjustment>(
            r#"
            INSERT INTO stock_adjustments (
                reference, product_id, location_id, previous_quantity,
                counted_quantity, difference, reason, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $5 - $4, $6, $7)
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(product_id)
        .bind(location_id)
        .bind(previous_quantity)
        .bind(counted_quantity)
        .bind(reason)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The adjustment"))?;
        Ok(adjustment)
    }

    pub async fn list_adjustments(&self) -> Result<Vec<StockAdjustment>, AppError> {
        let adjustments = sqlx::query_as::<_, StockAdjustment>(
            "SELECT * FROM stock_adjustments ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(adjustments)
    }

    // ---
    // Low-stock alerts
    // ---

    pub async fn has_open_alert<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM low_stock_alerts
                WHERE product_id = $1 AND location_id = $2 AND NOT is_resolved
            )
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// The partial unique index keeps one open alert per pair; a concurrent
    /// duplicate is silently skipped.
    pub async fn open_alert<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
        quantity: Decimal,
        reorder_level: Decimal,
    ) -> Result<Option<LowStockAlert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alert = sqlx::query_as::<_, LowStockAlert>(
            r#"
            INSERT INTO low_stock_alerts (product_id, location_id, quantity, reorder_level)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, location_id) WHERE NOT is_resolved DO NOTHING
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .bind(quantity)
        .bind(reorder_level)
        .fetch_optional(executor)
        .await?;
        Ok(alert)
    }

    pub async fn resolve_open_alerts<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE low_stock_alerts
            SET is_resolved = TRUE, resolved_at = NOW()
            WHERE product_id = $1 AND location_id = $2 AND NOT is_resolved
            "#,
        )
        .bind(product_id)
        .bind(location_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_alerts(&self, resolved: bool) -> Result<Vec<LowStockAlertEntry>, AppError> {
        let alerts = sqlx::query_as::<_, LowStockAlertEntry>(
            r#"
            SELECT
                a.*,
                p.sku AS product_sku,
                p.name AS product_name,
                l.code AS location_code
            FROM low_stock_alerts a
            JOIN products p ON p.id = a.product_id
            JOIN locations l ON l.id = a.location_id
            WHERE a.is_resolved = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(resolved)
        .fetch_all(&self.pool)
        .await?;
        Ok(alerts)
    }

    pub async fn find_alert(&self, id: Uuid) -> Result<Option<LowStockAlert>, AppError> {
        let alert = sqlx::query_as::<_, LowStockAlert>("SELECT * FROM low_stock_alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(alert)
    }

    /// `None` when the alert was already resolved (or never existed).
    pub async fn resolve_alert(&self, id: Uuid) -> Result<Option<LowStockAlert>, AppError> {
        let alert = sqlx::query_as::<_, LowStockAlert>(
            r#"
            UPDATE low_stock_alerts
            SET is_resolved = TRUE, resolved_at = NOW()
            WHERE id = $1 AND NOT is_resolved
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_zero_padded_per_document_kind() {
        assert_eq!(ReferenceSequence::Receipt.format(1), "WH/IN/00001");
        assert_eq!(ReferenceSequence::Delivery.format(42), "WH/OUT/00042");
        assert_eq!(ReferenceSequence::Transfer.format(7), "WH/INT/00007");
        assert_eq!(ReferenceSequence::Adjustment.format(123_456), "WH/ADJ/123456");
    }
}
