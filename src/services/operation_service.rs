// src/services/operation_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, OperationsRepository, inventory_repo::ReferenceSequence},
    models::{
        auth::User,
        inventory::MoveType,
        operations::{
            CreateDeliveryPayload, CreateReceiptPayload, CreateTransferPayload, DeliveryDetail,
            DeliveryOrder, DocumentItem, DocumentLinePayload, DocumentStatus, InternalTransfer,
            ReceiptDetail, ReceiptOrder,
        },
    },
    services::inventory_service::{InventoryService, MoveContext},
};

/// Sums quantities of repeated products, keeping first-seen order.
pub fn merge_lines(lines: &[DocumentLinePayload]) -> Vec<(Uuid, Decimal)> {
    let mut order: Vec<Uuid> = Vec::with_capacity(lines.len());
    let mut totals: HashMap<Uuid, Decimal> = HashMap::with_capacity(lines.len());
    for line in lines {
        totals
            .entry(line.product_id)
            .and_modify(|q| *q += line.quantity)
            .or_insert_with(|| {
                order.push(line.product_id);
                line.quantity
            });
    }
    order.into_iter().map(|id| (id, totals[&id])).collect()
}

pub fn ensure_draft(entity: &'static str, reference: &str, status: DocumentStatus) -> Result<(), AppError> {
    if status.is_open() {
        return Ok(());
    }
    Err(AppError::InvalidStatus {
        entity,
        reference: reference.to_string(),
        status: status.as_str().to_string(),
    })
}

/// Locks are always taken in product-id order so that two documents sharing
/// products cannot deadlock each other.
fn in_lock_order(mut items: Vec<DocumentItem>) -> Vec<DocumentItem> {
    items.sort_by_key(|item| item.product_id);
    items
}

#[derive(Clone)]
pub struct OperationsService {
    repo: OperationsRepository,
    catalog_repo: CatalogRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl OperationsService {
    pub fn new(
        repo: OperationsRepository,
        catalog_repo: CatalogRepository,
        inventory_service: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self { repo, catalog_repo, inventory_service, pool }
    }

    async fn require_lines(
        &self,
        conn: &mut PgConnection,
        lines: &[DocumentLinePayload],
    ) -> Result<Vec<(Uuid, Decimal)>, AppError> {
        let merged = merge_lines(lines);
        for (product_id, _) in &merged {
            self.inventory_service.require_active_product(&mut *conn, *product_id).await?;
        }
        Ok(merged)
    }

    // =========================================================================
    //  RECEIPTS
    // =========================================================================

    pub async fn create_receipt(&self, user: &User, payload: &CreateReceiptPayload) -> Result<ReceiptDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let vendor = self
            .catalog_repo
            .find_vendor(&mut *tx, payload.vendor_id)
            .await?
            .ok_or(AppError::NotFound("Vendor"))?;
        if !vendor.is_active {
            return Err(AppError::BadRequest(format!("Vendor {} is inactive.", vendor.name)));
        }
        self.inventory_service.require_active_location(&mut *tx, payload.location_id).await?;
        let lines = self.require_lines(&mut *tx, &payload.items).await?;

        let reference = self
            .inventory_service
            .repo()
            .next_reference(&mut *tx, ReferenceSequence::Receipt)
            .await?;

        let receipt = self
            .repo
            .create_receipt(
                &mut *tx,
                &reference,
                vendor.id,
                payload.location_id,
                payload.scheduled_date,
                payload.notes.as_deref(),
                user.id,
            )
            .await?;

        for (product_id, quantity) in lines {
            self.repo.add_receipt_item(&mut *tx, receipt.id, product_id, quantity).await?;
        }
        let items = self.repo.receipt_items(&mut *tx, receipt.id).await?;

        tx.commit().await?;

        tracing::info!(reference = %receipt.reference, lines = items.len(), "📥 Receipt drafted");
        Ok(ReceiptDetail { receipt, items })
    }

    pub async fn list_receipts(&self, status: Option<DocumentStatus>) -> Result<Vec<ReceiptOrder>, AppError> {
        self.repo.list_receipts(status).await
    }

    pub async fn get_receipt(&self, id: Uuid) -> Result<ReceiptDetail, AppError> {
        let receipt = self
            .repo
            .find_receipt(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Receipt"))?;
        let items = self.repo.receipt_items(&self.pool, id).await?;
        Ok(ReceiptDetail { receipt, items })
    }

    /// DRAFT → DONE: every line is added to the destination location.
    pub async fn validate_receipt(&self, user: &User, id: Uuid) -> Result<ReceiptDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let receipt = self
            .repo
            .lock_receipt(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Receipt"))?;
        ensure_draft("Receipt", &receipt.reference, receipt.status)?;
        self.inventory_service.require_active_location(&mut *tx, receipt.location_id).await?;

        let items = self.repo.receipt_items(&mut *tx, id).await?;
        let ctx = MoveContext { reference: &receipt.reference, source_id: receipt.id, performed_by: user.id };

        for item in in_lock_order(items.clone()) {
            let product = self.inventory_service.require_active_product(&mut *tx, item.product_id).await?;
            self.inventory_service
                .add_stock(&mut *tx, ctx, &product, receipt.location_id, item.quantity, MoveType::Receipt)
                .await?;
        }

        let receipt = self
            .repo
            .set_receipt_status(&mut *tx, id, DocumentStatus::Done, Some(user.id))
            .await?;

        tx.commit().await?;

        tracing::info!(reference = %receipt.reference, validated_by = %user.id, "✅ Receipt validated");
        Ok(ReceiptDetail { receipt, items })
    }

    pub async fn cancel_receipt(&self, id: Uuid) -> Result<ReceiptOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let receipt = self
            .repo
            .lock_receipt(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Receipt"))?;
        ensure_draft("Receipt", &receipt.reference, receipt.status)?;

        let receipt = self
            .repo
            .set_receipt_status(&mut *tx, id, DocumentStatus::Canceled, None)
            .await?;
        tx.commit().await?;

        tracing::info!(reference = %receipt.reference, "Receipt canceled");
        Ok(receipt)
    }

    // =========================================================================
    //  DELIVERIES
    // =========================================================================

    pub async fn create_delivery(&self, user: &User, payload: &CreateDeliveryPayload) -> Result<DeliveryDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        self.inventory_service.require_active_location(&mut *tx, payload.location_id).await?;
        let lines = self.require_lines(&mut *tx, &payload.items).await?;

        let reference = self
            .inventory_service
            .repo()
            .next_reference(&mut *tx, ReferenceSequence::Delivery)
            .await?;

        let delivery = self
            .repo
            .create_delivery(
                &mut *tx,
                &reference,
                payload.customer_name.trim(),
                payload.location_id,
                payload.scheduled_date,
                payload.notes.as_deref(),
                user.id,
            )
            .await?;

        for (product_id, quantity) in lines {
            self.repo.add_delivery_item(&mut *tx, delivery.id, product_id, quantity).await?;
        }
        let items = self.repo.delivery_items(&mut *tx, delivery.id).await?;

        tx.commit().await?;

        tracing::info!(reference = %delivery.reference, lines = items.len(), "📤 Delivery drafted");
        Ok(DeliveryDetail { delivery, items })
    }

    pub async fn list_deliveries(&self, status: Option<DocumentStatus>) -> Result<Vec<DeliveryOrder>, AppError> {
        self.repo.list_deliveries(status).await
    }

    pub async fn get_delivery(&self, id: Uuid) -> Result<DeliveryDetail, AppError> {
        let delivery = self
            .repo
            .find_delivery(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Delivery"))?;
        let items = self.repo.delivery_items(&self.pool, id).await?;
        Ok(DeliveryDetail { delivery, items })
    }

    /// DRAFT → DONE. All lines ship or none do: the first short line aborts
    /// the transaction and nothing is decremented.
    pub async fn validate_delivery(&self, user: &User, id: Uuid) -> Result<DeliveryDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let delivery = self
            .repo
            .lock_delivery(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Delivery"))?;
        ensure_draft("Delivery", &delivery.reference, delivery.status)?;

        let items = self.repo.delivery_items(&mut *tx, id).await?;
        let ctx = MoveContext { reference: &delivery.reference, source_id: delivery.id, performed_by: user.id };

        for item in in_lock_order(items.clone()) {
            // Inactive products may still leave the warehouse.
            let product = self
                .catalog_repo
                .find_product(&mut *tx, item.product_id)
                .await?
                .ok_or(AppError::NotFound("Product"))?;
            self.inventory_service
                .remove_stock(&mut *tx, ctx, &product, delivery.location_id, item.quantity, MoveType::Delivery)
                .await?;
        }

        let delivery = self
            .repo
            .set_delivery_status(&mut *tx, id, DocumentStatus::Done, Some(user.id))
            .await?;

        tx.commit().await?;

        tracing::info!(reference = %delivery.reference, validated_by = %user.id, "✅ Delivery validated");
        Ok(DeliveryDetail { delivery, items })
    }

    pub async fn cancel_delivery(&self, id: Uuid) -> Result<DeliveryOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let delivery = self
            .repo
            .lock_delivery(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Delivery"))?;
        ensure_draft("Delivery", &delivery.reference, delivery.status)?;

        let delivery = self
            .repo
            .set_delivery_status(&mut *tx, id, DocumentStatus::Canceled, None)
            .await?;
        tx.commit().await?;

        tracing::info!(reference = %delivery.reference, "Delivery canceled");
        Ok(delivery)
    }

    // =========================================================================
    //  INTERNAL TRANSFERS
    // =========================================================================

    pub async fn create_transfer(&self, user: &User, payload: &CreateTransferPayload) -> Result<InternalTransfer, AppError> {
        let mut tx = self.pool.begin().await?;

        self.inventory_service.require_active_product(&mut *tx, payload.product_id).await?;
        self.inventory_service.require_active_location(&mut *tx, payload.from_location_id).await?;
        self.inventory_service.require_active_location(&mut *tx, payload.to_location_id).await?;

        let reference = self
            .inventory_service
            .repo()
            .next_reference(&mut *tx, ReferenceSequence::Transfer)
            .await?;

        let transfer = self
            .repo
            .create_transfer(
                &mut *tx,
                &reference,
                payload.product_id,
                payload.from_location_id,
                payload.to_location_id,
                payload.quantity,
                payload.notes.as_deref(),
                user.id,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(reference = %transfer.reference, "🔁 Transfer drafted");
        Ok(transfer)
    }

    pub async fn list_transfers(&self, status: Option<DocumentStatus>) -> Result<Vec<InternalTransfer>, AppError> {
        self.repo.list_transfers(status).await
    }

    pub async fn get_transfer(&self, id: Uuid) -> Result<InternalTransfer, AppError> {
        self.repo.find_transfer(id).await?.ok_or(AppError::NotFound("Transfer"))
    }

    /// DRAFT → DONE: source loses the quantity, destination gains it, one
    /// move row each.
    pub async fn validate_transfer(&self, user: &User, id: Uuid) -> Result<InternalTransfer, AppError> {
        let mut tx = self.pool.begin().await?;

        let transfer = self
            .repo
            .lock_transfer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Transfer"))?;
        ensure_draft("Transfer", &transfer.reference, transfer.status)?;

        let product = self
            .catalog_repo
            .find_product(&mut *tx, transfer.product_id)
            .await?
            .ok_or(AppError::NotFound("Product"))?;
        self.inventory_service.require_active_location(&mut *tx, transfer.to_location_id).await?;

        // Lock both stock rows in a fixed order before mutating either.
        let mut pair = [transfer.from_location_id, transfer.to_location_id];
        pair.sort();
        for location_id in pair {
            self.inventory_service
                .repo()
                .lock_stock(&mut *tx, transfer.product_id, location_id)
                .await?;
        }

        let ctx = MoveContext { reference: &transfer.reference, source_id: transfer.id, performed_by: user.id };
        self.inventory_service
            .remove_stock(&mut *tx, ctx, &product, transfer.from_location_id, transfer.quantity, MoveType::TransferOut)
            .await?;
        self.inventory_service
            .add_stock(&mut *tx, ctx, &product, transfer.to_location_id, transfer.quantity, MoveType::TransferIn)
            .await?;

        let transfer = self
            .repo
            .set_transfer_status(&mut *tx, id, DocumentStatus::Done, Some(user.id))
            .await?;

        tx.commit().await?;

        tracing::info!(reference = %transfer.reference, validated_by = %user.id, "✅ Transfer validated");
        Ok(transfer)
    }

    pub async fn cancel_transfer(&self, id: Uuid) -> Result<InternalTransfer, AppError> {
        let mut tx = self.pool.begin().await?;

        let transfer = self
            .repo
            .lock_transfer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Transfer"))?;
        ensure_draft("Transfer", &transfer.reference, transfer.status)?;

        let transfer = self
            .repo
            .set_transfer_status(&mut *tx, id, DocumentStatus::Canceled, None)
            .await?;
        tx.commit().await?;

        tracing::info!(reference = %transfer.reference, "Transfer canceled");
        Ok(transfer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(product_id: Uuid, quantity: Decimal) -> DocumentLinePayload {
        DocumentLinePayload { product_id, quantity }
    }

    #[test]
    fn repeated_products_are_summed_in_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[line(a, dec!(2)), line(b, dec!(1)), line(a, dec!(3.5))]);
        assert_eq!(merged, vec![(a, dec!(5.5)), (b, dec!(1))]);
    }

    #[test]
    fn terminal_documents_cannot_change() {
        assert!(ensure_draft("Receipt", "WH/IN/00001", DocumentStatus::Draft).is_ok());

        let err = ensure_draft("Delivery", "WH/OUT/00009", DocumentStatus::Done).unwrap_err();
        assert!(matches!(err, AppError::InvalidStatus { entity: "Delivery", .. }));
        assert!(ensure_draft("Transfer", "WH/INT/00002", DocumentStatus::Canceled).is_err());
    }

    #[test]
    fn lock_order_sorts_by_product() {
        let mut ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let items: Vec<DocumentItem> = ids
            .iter()
            .map(|id| DocumentItem {
                id: Uuid::new_v4(),
                product_id: *id,
                product_sku: "SKU".into(),
                product_name: "Thing".into(),
                quantity: dec!(1),
            })
            .collect();
        ids.sort();
        let ordered: Vec<Uuid> = in_lock_order(items).into_iter().map(|i| i.product_id).collect();
        assert_eq!(ordered, ids);
    }
}
