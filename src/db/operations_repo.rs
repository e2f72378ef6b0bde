// src/db/operations_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::operations::{
        DeliveryOrder, DocumentItem, DocumentStatus, InternalTransfer, ReceiptOrder,
    },
};

#[derive(Clone)]
pub struct OperationsRepository {
    pool: PgPool,
}

impl OperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  RECEIPTS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_receipt<'e, E>(
        &self,
        executor: E,
        reference: &str,
        vendor_id: Uuid,
        location_id: Uuid,
        scheduled_date: Option<NaiveDate>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<ReceiptOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, ReceiptOrder>(
            r#"
            INSERT INTO receipt_orders (reference, vendor_id, location_id, scheduled_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(vendor_id)
        .bind(location_id)
        .bind(scheduled_date)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The receipt"))?;
        Ok(receipt)
    }

    pub async fn add_receipt_item<'e, E>(
        &self,
        executor: E,
        receipt_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO receipt_items (receipt_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(receipt_id)
            .bind(product_id)
            .bind(quantity)
            .execute(executor)
            .await
            .map_err(|e| map_db_error(e, "The receipt line"))?;
        Ok(())
    }

    pub async fn list_receipts(&self, status: Option<DocumentStatus>) -> Result<Vec<ReceiptOrder>, AppError> {
        let receipts = sqlx::query_as::<_, ReceiptOrder>(
            r#"
            SELECT * FROM receipt_orders
            WHERE ($1::document_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(receipts)
    }

    pub async fn find_receipt<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ReceiptOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, ReceiptOrder>("SELECT * FROM receipt_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(receipt)
    }

    /// Row lock held until commit; concurrent validations queue behind it.
    pub async fn lock_receipt<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ReceiptOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, ReceiptOrder>(
            "SELECT * FROM receipt_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(receipt)
    }

    pub async fn receipt_items<'e, E>(&self, executor: E, receipt_id: Uuid) -> Result<Vec<DocumentItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DocumentItem>(
            r#"
            SELECT ri.id, ri.product_id, p.sku AS product_sku, p.name AS product_name, ri.quantity
            FROM receipt_items ri
            JOIN products p ON p.id = ri.product_id
            WHERE ri.receipt_id = $1
            ORDER BY p.sku ASC
            "#,
        )
        .bind(receipt_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn set_receipt_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DocumentStatus,
        validated_by: Option<Uuid>,
    ) -> Result<ReceiptOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, ReceiptOrder>(
            r#"
            UPDATE receipt_orders SET
                status = $2,
                validated_by = $3,
                validated_at = CASE WHEN $3::uuid IS NULL THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(validated_by)
        .fetch_one(executor)
        .await?;
        Ok(receipt)
    }

    // =========================================================================
    //  DELIVERIES
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_delivery<'e, E>(
        &self,
        executor: E,
        reference: &str,
        customer_name: &str,
        location_id: Uuid,
        scheduled_date: Option<NaiveDate>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<DeliveryOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let delivery = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            INSERT INTO delivery_orders (reference, customer_name, location_id, scheduled_date, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(customer_name)
        .bind(location_id)
        .bind(scheduled_date)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The delivery"))?;
        Ok(delivery)
    }

    pub async fn add_delivery_item<'e, E>(
        &self,
        executor: E,
        delivery_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO delivery_items (delivery_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(delivery_id)
            .bind(product_id)
            .bind(quantity)
            .execute(executor)
            .await
            .map_err(|e| map_db_error(e, "The delivery line"))?;
        Ok(())
    }

    pub async fn list_deliveries(&self, status: Option<DocumentStatus>) -> Result<Vec<DeliveryOrder>, AppError> {
        let deliveries = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            SELECT * FROM delivery_orders
            WHERE ($1::document_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(deliveries)
    }

    pub async fn find_delivery<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DeliveryOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let delivery = sqlx::query_as::<_, DeliveryOrder>("SELECT * FROM delivery_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(delivery)
    }

    pub async fn lock_delivery<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<DeliveryOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let delivery = sqlx::query_as::<_, DeliveryOrder>(
            "SELECT * FROM delivery_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(delivery)
    }

    pub async fn delivery_items<'e, E>(&self, executor: E, delivery_id: Uuid) -> Result<Vec<DocumentItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, DocumentItem>(
            r#"
            SELECT di.id, di.product_id, p.sku AS product_sku, p.name AS product_name, di.quantity
            FROM delivery_items di
            JOIN products p ON p.id = di.product_id
            WHERE di.delivery_id = $1
            ORDER BY p.sku ASC
            "#,
        )
        .bind(delivery_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn set_delivery_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DocumentStatus,
        validated_by: Option<Uuid>,
    ) -> Result<DeliveryOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let delivery = sqlx::query_as::<_, DeliveryOrder>(
            r#"
            UPDATE delivery_orders SET
                status = $2,
                validated_by = $3,
                validated_at = CASE WHEN $3::uuid IS NULL THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(validated_by)
        .fetch_one(executor)
        .await?;
        Ok(delivery)
    }

    // =========================================================================
    //  INTERNAL TRANSFERS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_transfer<'e, E>(
        &self,
        executor: E,
        reference: &str,
        product_id: Uuid,
        from_location_id: Uuid,
        to_location_id: Uuid,
        quantity: Decimal,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<InternalTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, InternalTransfer>(
            r#"
            INSERT INTO internal_transfers (
                reference, product_id, from_location_id, to_location_id, quantity, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(reference)
        .bind(product_id)
        .bind(from_location_id)
        .bind(to_location_id)
        .bind(quantity)
        .bind(notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_db_error(e, "The transfer"))?;
        Ok(transfer)
    }

    pub async fn list_transfers(&self, status: Option<DocumentStatus>) -> Result<Vec<InternalTransfer>, AppError> {
        let transfers = sqlx::query_as::<_, InternalTransfer>(
            r#"
            SELECT * FROM internal_transfers
            WHERE ($1::document_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(transfers)
    }

    pub async fn find_transfer(&self, id: Uuid) -> Result<Option<InternalTransfer>, AppError> {
        let transfer = sqlx::query_as::<_, InternalTransfer>("SELECT * FROM internal_transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(transfer)
    }

    pub async fn lock_transfer<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<InternalTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, InternalTransfer>(
            "SELECT * FROM internal_transfers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(transfer)
    }

    pub async fn set_transfer_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DocumentStatus,
        validated_by: Option<Uuid>,
    ) -> Result<InternalTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, InternalTransfer>(
            r#"
            UPDATE internal_transfers SET
                status = $2,
                validated_by = $3,
                validated_at = CASE WHEN $3::uuid IS NULL THEN NULL ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(validated_by)
        .fetch_one(executor)
        .await?;
        Ok(transfer)
    }
}
