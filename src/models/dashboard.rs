// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// The cards at the top of the dashboard.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_products: i64,
    #[schema(value_type = f64)]
    pub total_on_hand: Decimal,
    pub low_stock_items: i64,
    pub open_alerts: i64,
    pub pending_receipts: i64,
    pub pending_deliveries: i64,
    pub pending_transfers: i64,
}
