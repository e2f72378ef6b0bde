// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::models::inventory::{validate_not_blank, validate_not_negative};

/// Tells an absent key (`None`) apart from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Value for a clearable column in a partial update, and whether to write it.
pub(crate) fn clearable(field: &Option<Option<String>>) -> (bool, Option<&str>) {
    (field.is_some(), field.as_ref().and_then(|v| v.as_deref()))
}

// --- Products ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "STL-ROD-12")]
    pub sku: String,
    #[schema(example = "Steel Rod 12mm")]
    pub name: String,
    #[schema(example = "Raw Materials")]
    pub category: Option<String>,
    #[schema(example = "kg")]
    pub unit_of_measure: String,
    pub description: Option<String>,
    #[schema(value_type = f64, example = 20.0)]
    pub reorder_level: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The SKU is required."),
        length(max = 64)
    )]
    pub sku: String,
    #[validate(
        custom(function = "validate_not_blank", message = "The name is required."),
        length(max = 200)
    )]
    pub name: String,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64)]
    pub reorder_level: Decimal,
}

/// Partial update: absent fields keep their current value, an explicit
/// `null` clears a nullable one.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The SKU cannot be empty."),
        length(max = 64)
    )]
    pub sku: Option<String>,
    #[validate(
        custom(function = "validate_not_blank", message = "The name cannot be empty."),
        length(max = 200)
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub category: Option<Option<String>>,
    pub unit_of_measure: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub reorder_level: Option<Decimal>,
    pub is_active: Option<bool>,
}

// --- Locations (warehouses, racks, zones) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[schema(example = "WH-MAIN")]
    pub code: String,
    #[schema(example = "Main Warehouse")]
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The code is required."),
        length(max = 32)
    )]
    pub code: String,
    #[validate(
        custom(function = "validate_not_blank", message = "The name is required."),
        length(max = 200)
    )]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The code cannot be empty."),
        length(max = 32)
    )]
    pub code: Option<String>,
    #[validate(
        custom(function = "validate_not_blank", message = "The name cannot be empty."),
        length(max = 200)
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub address: Option<Option<String>>,
    pub is_active: Option<bool>,
}

// --- Vendors ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: Uuid,
    #[schema(example = "Acme Metals")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVendorPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The name is required."),
        length(max = 200)
    )]
    pub name: String,
    #[validate(email(message = "The email address is invalid."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_vendor_update_email"))]
pub struct UpdateVendorPayload {
    #[validate(
        custom(function = "validate_not_blank", message = "The name cannot be empty."),
        length(max = 200)
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub address: Option<Option<String>>,
    pub is_active: Option<bool>,
}

fn validate_vendor_update_email(payload: &UpdateVendorPayload) -> Result<(), ValidationError> {
    match &payload.email {
        Some(Some(email)) if !email.validate_email() => {
            let mut err = ValidationError::new("email");
            err.message = Some("The email address is invalid.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Case-insensitive match on name and SKU/code.
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// What a delete did: records still referenced by stock or documents are
/// only deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeleteOutcome {
    Deleted,
    Deactivated,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub outcome: DeleteOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn product_rejects_negative_reorder_level() {
        let payload = CreateProductPayload {
            sku: "STL-ROD-12".into(),
            name: "Steel Rod".into(),
            category: None,
            unit_of_measure: None,
            description: None,
            reorder_level: dec!(-1),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateProductPayload::default().validate().is_ok());
        assert!(UpdateVendorPayload::default().validate().is_ok());
    }

    #[test]
    fn vendor_email_is_checked_when_present() {
        let payload = CreateVendorPayload {
            name: "Acme".into(),
            email: Some("not-an-email".into()),
            phone: None,
            address: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn explicit_null_clears_and_absent_keeps() {
        let payload: UpdateProductPayload =
            serde_json::from_str(r#"{"category":null,"description":"Zinc coated"}"#).unwrap();
        assert_eq!(payload.category, Some(None));
        assert_eq!(payload.description, Some(Some("Zinc coated".to_string())));
        assert_eq!(payload.unit_of_measure, None);
        assert_eq!(clearable(&payload.category), (true, None));
        assert_eq!(clearable(&payload.description), (true, Some("Zinc coated")));

        let payload: UpdateVendorPayload = serde_json::from_str(r#"{"name":"Acme"}"#).unwrap();
        assert_eq!(payload.phone, None);
        assert_eq!(clearable(&payload.phone), (false, None));
    }

    #[test]
    fn vendor_update_email_is_checked_unless_cleared() {
        let bad: UpdateVendorPayload = serde_json::from_str(r#"{"email":"nope"}"#).unwrap();
        assert!(bad.validate().is_err());
        let cleared: UpdateVendorPayload = serde_json::from_str(r#"{"email":null}"#).unwrap();
        assert!(cleared.validate().is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let payload = CreateLocationPayload { code: " ".into(), name: "Main".into(), address: None };
        assert!(payload.validate().is_err());
        let update = UpdateLocationPayload { name: Some("\t".into()), ..Default::default() };
        assert!(update.validate().is_err());
    }

    #[test]
    fn create_product_defaults_reorder_level() {
        let payload: CreateProductPayload =
            serde_json::from_str(r#"{"sku":"A-1","name":"Bolt","unitOfMeasure":"box"}"#).unwrap();
        assert_eq!(payload.reorder_level, Decimal::ZERO);
        assert_eq!(payload.unit_of_measure.as_deref(), Some("box"));
    }
}
