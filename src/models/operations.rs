// src/models/operations.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::inventory::{validate_not_blank, validate_positive};

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Done,
    Canceled,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Done => "DONE",
            DocumentStatus::Canceled => "CANCELED",
        }
    }

    /// Only drafts can be validated or canceled.
    pub fn is_open(self) -> bool {
        self == DocumentStatus::Draft
    }
}

// --- Shared lines ---
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLinePayload {
    pub product_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 10.0)]
    pub quantity: Decimal,
}

/// Receipt or delivery line joined with its product.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentQuery {
    pub status: Option<DocumentStatus>,
}

// --- Receipts (incoming goods from vendors) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptOrder {
    pub id: Uuid,
    #[schema(example = "WH/IN/00001")]
    pub reference: String,
    pub vendor_id: Uuid,
    pub location_id: Uuid,
    pub status: DocumentStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub receipt: ReceiptOrder,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptPayload {
    pub vendor_id: Uuid,
    pub location_id: Uuid,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required."), nested)]
    pub items: Vec<DocumentLinePayload>,
}

// --- Deliveries (outgoing goods to customers) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrder {
    pub id: Uuid,
    #[schema(example = "WH/OUT/00001")]
    pub reference: String,
    pub customer_name: String,
    pub location_id: Uuid,
    pub status: DocumentStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryDetail {
    #[serde(flatten)]
    pub delivery: DeliveryOrder,
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The customer name is required."),
        length(max = 200, message = "The customer name is too long.")
    )]
    pub customer_name: String,
    pub location_id: Uuid,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required."), nested)]
    pub items: Vec<DocumentLinePayload>,
}

// --- Internal transfers ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalTransfer {
    pub id: Uuid,
    #[schema(example = "WH/INT/00001")]
    pub reference: String,
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub status: DocumentStatus,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferPayload {
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 5.0)]
    pub quantity: Decimal,
    pub notes: Option<String>,
}

impl CreateTransferPayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.from_location_id == self.to_location_id {
            let mut err = ValidationError::new("SameLocation");
            err.message = Some("Source and destination locations must differ.".into());
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal) -> DocumentLinePayload {
        DocumentLinePayload { product_id: Uuid::new_v4(), quantity }
    }

    #[test]
    fn receipt_needs_items() {
        let payload = CreateReceiptPayload {
            vendor_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            scheduled_date: None,
            notes: None,
            items: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn nested_lines_are_validated() {
        let payload = CreateDeliveryPayload {
            customer_name: "Globex".into(),
            location_id: Uuid::new_v4(),
            scheduled_date: None,
            notes: None,
            items: vec![line(dec!(2)), line(dec!(0))],
        };
        assert!(payload.validate().is_err());

        let payload = CreateDeliveryPayload { items: vec![line(dec!(2))], ..payload };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn blank_customer_name_is_rejected() {
        let payload = CreateDeliveryPayload {
            customer_name: " \n ".into(),
            location_id: Uuid::new_v4(),
            scheduled_date: None,
            notes: None,
            items: vec![line(dec!(1))],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("customer_name"));
    }

    #[test]
    fn line_quantity_with_too_many_decimals_is_rejected() {
        let payload = CreateReceiptPayload {
            vendor_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            scheduled_date: None,
            notes: None,
            items: vec![line(dec!(0.00001))],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn transfer_between_same_location_is_rejected() {
        let location = Uuid::new_v4();
        let payload = CreateTransferPayload {
            product_id: Uuid::new_v4(),
            from_location_id: location,
            to_location_id: location,
            quantity: dec!(1),
            notes: None,
        };
        assert!(payload.validate().is_ok());
        assert!(payload.validate_consistency().is_err());
    }

    #[test]
    fn only_drafts_are_open() {
        assert!(DocumentStatus::Draft.is_open());
        assert!(!DocumentStatus::Done.is_open());
        assert!(!DocumentStatus::Canceled.is_open());
        assert_eq!(DocumentStatus::Canceled.as_str(), "CANCELED");
    }
}
