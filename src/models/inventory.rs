// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Custom validators
// ---

/// Quantities are stored as NUMERIC(18, 4).
pub(crate) const MAX_QUANTITY_SCALE: u32 = 4;
/// Exclusive upper bound for the integer part of a NUMERIC(18, 4).
pub(crate) const MAX_QUANTITY: Decimal = Decimal::from_parts(0x107A_4000, 0x5AF3, 0, false, 0);

fn check_storable(val: &Decimal) -> Result<(), ValidationError> {
    if val.normalize().scale() > MAX_QUANTITY_SCALE {
        let mut err = ValidationError::new("scale");
        err.add_param("max_scale".into(), &MAX_QUANTITY_SCALE);
        err.message = Some("At most 4 decimal places are allowed.".into());
        return Err(err);
    }
    if val.abs() >= MAX_QUANTITY {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_max".into(), &1e14);
        err.message = Some("The value is too large.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("The value cannot be negative.".into());
        return Err(err);
    }
    check_storable(val)
}

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("The quantity must be greater than zero.".into());
        return Err(err);
    }
    check_storable(val)
}

/// `length(min = 1)` counts whitespace; this does not.
pub(crate) fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field cannot be blank.".into());
        return Err(err);
    }
    Ok(())
}

// --- Stock (one row per product/location pair) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Stock row joined with the product and location it belongs to.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    pub unit_of_measure: String,
    pub location_id: Uuid,
    pub location_code: String,
    pub location_name: String,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[schema(value_type = f64)]
    pub reorder_level: Decimal,
    pub is_low_stock: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Only pairs at or below their reorder level.
    #[serde(default)]
    pub low_stock_only: bool,
}

// --- Move history (audit trail) ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "move_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveType {
    Receipt,
    Delivery,
    TransferOut,
    TransferIn,
    Adjustment,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveHistory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub move_type: MoveType,
    #[schema(value_type = f64, example = -5.0)]
    pub quantity_change: Decimal,
    #[schema(value_type = f64)]
    pub quantity_after: Decimal,
    #[schema(example = "WH/OUT/00012")]
    pub reference: String,
    pub source_id: Uuid,
    pub performed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveHistoryEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: MoveHistory,
    pub product_sku: String,
    pub location_code: String,
    pub performed_by_name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MoveHistoryQuery {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub move_type: Option<MoveType>,
    /// Defaults to 50, capped at 500.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// --- Adjustments ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub id: Uuid,
    #[schema(example = "WH/ADJ/00004")]
    pub reference: String,
    pub product_id: Uuid,
    pub location_id: Uuid,
    #[schema(value_type = f64)]
    pub previous_quantity: Decimal,
    #[schema(value_type = f64)]
    pub counted_quantity: Decimal,
    #[schema(value_type = f64)]
    pub difference: Decimal,
    pub reason: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdjustmentPayload {
    pub product_id: Uuid,
    pub location_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 47.0)]
    pub counted_quantity: Decimal,
    #[validate(
        custom(function = "validate_not_blank", message = "A reason is required."),
        length(max = 500, message = "The reason is too long.")
    )]
    #[schema(example = "Cycle count")]
    pub reason: String,
}

// --- Low-stock alerts ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    #[schema(value_type = f64)]
    pub reorder_level: Decimal,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlertEntry {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub alert: LowStockAlert,
    pub product_sku: String,
    pub product_name: String,
    pub location_code: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertQuery {
    /// `false` (default) lists open alerts, `true` resolved ones.
    #[serde(default)]
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_is_not_negative_but_is_not_positive() {
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_not_negative(&dec!(-0.5)).is_err());
        assert!(validate_positive(&dec!(0.001)).is_ok());
    }

    #[test]
    fn quantities_must_fit_the_storage_column() {
        assert!(validate_positive(&dec!(0.0001)).is_ok());
        assert!(validate_positive(&dec!(0.00001)).is_err());
        // trailing zeros do not count as precision
        assert!(validate_positive(&dec!(1.50000)).is_ok());
        assert!(validate_not_negative(&dec!(99999999999999.9999)).is_ok());
        assert!(validate_not_negative(&dec!(100000000000000)).is_err());
        assert!(validate_not_negative(&dec!(10000000000000000)).is_err());
        assert_eq!(MAX_QUANTITY, dec!(100000000000000));
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("  \t ").is_err());
        assert!(validate_not_blank(" Cycle count ").is_ok());
    }

    #[test]
    fn whitespace_reason_is_rejected() {
        let payload = CreateAdjustmentPayload {
            product_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            counted_quantity: dec!(3),
            reason: "   ".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("reason"));
    }

    #[test]
    fn adjustment_requires_reason() {
        let payload = CreateAdjustmentPayload {
            product_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            counted_quantity: dec!(3),
            reason: String::new(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn move_type_wire_names() {
        assert_eq!(serde_json::to_string(&MoveType::TransferOut).unwrap(), "\"TRANSFER_OUT\"");
    }
}
