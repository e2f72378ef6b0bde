// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{common::error::AppError, models::dashboard::DashboardSummary};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One statement, so every card comes from the same snapshot.
    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        let summary = sqlx::query_as::<_, DashboardSummary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE is_active) AS total_products,
                (SELECT COALESCE(SUM(quantity), 0) FROM stock) AS total_on_hand,
                (
                    SELECT COUNT(*)
                    FROM stock s
                    JOIN products p ON p.id = s.product_id
                    WHERE p.is_active AND p.reorder_level > 0 AND s.quantity <= p.reorder_level
                ) AS low_stock_items,
                (SELECT COUNT(*) FROM low_stock_alerts WHERE NOT is_resolved) AS open_alerts,
                (SELECT COUNT(*) FROM receipt_orders WHERE status = 'DRAFT') AS pending_receipts,
                (SELECT COUNT(*) FROM delivery_orders WHERE status = 'DRAFT') AS pending_deliveries,
                (SELECT COUNT(*) FROM internal_transfers WHERE status = 'DRAFT') AS pending_transfers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }
}
