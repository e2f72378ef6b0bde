// src/db/catalog_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::catalog::{
        CatalogQuery, CreateLocationPayload, CreateProductPayload, CreateVendorPayload,
        DeleteOutcome, Location, Product, UpdateLocationPayload, UpdateProductPayload,
        UpdateVendorPayload, Vendor, clearable,
    },
};

/// Products, locations and vendors.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Products
    // ---

    pub async fn list_products(&self, query: &CatalogQuery) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%')
              AND ($2 OR is_active)
            ORDER BY name ASC
            "#,
        )
        .bind(query.search.as_deref())
        .bind(query.include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn create_product(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (sku, name, category, unit_of_measure, description, reorder_level)
            VALUES ($1, $2, $3, COALESCE($4, 'unit'), $5, $6)
            RETURNING *
            "#,
        )
        .bind(payload.sku.trim())
        .bind(payload.name.trim())
        .bind(payload.category.as_deref())
        .bind(payload.unit_of_measure.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.reorder_level)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A product with this SKU"))
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Option<Product>, AppError> {
        let (set_category, category) = clearable(&payload.category);
        let (set_description, description) = clearable(&payload.description);
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                sku = COALESCE($2, sku),
                name = COALESCE($3, name),
                category = CASE WHEN $4 THEN $5::text ELSE category END,
                unit_of_measure = COALESCE($6, unit_of_measure),
                description = CASE WHEN $7 THEN $8::text ELSE description END,
                reorder_level = COALESCE($9, reorder_level),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.sku.as_deref().map(str::trim))
        .bind(payload.name.as_deref().map(str::trim))
        .bind(set_category)
        .bind(category)
        .bind(payload.unit_of_measure.as_deref())
        .bind(set_description)
        .bind(description)
        .bind(payload.reorder_level)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A product with this SKU"))
    }

    // ---
    // Locations
    // ---

    pub async fn list_locations(&self, query: &CatalogQuery) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR code ILIKE '%' || $1 || '%')
              AND ($2 OR is_active)
            ORDER BY code ASC
            "#,
        )
        .bind(query.search.as_deref())
        .bind(query.include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    pub async fn find_location<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(location)
    }

    pub async fn create_location(&self, payload: &CreateLocationPayload) -> Result<Location, AppError> {
        sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (code, name, address)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(payload.code.trim())
        .bind(payload.name.trim())
        .bind(payload.address.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A location with this code"))
    }

    pub async fn update_location(
        &self,
        id: Uuid,
        payload: &UpdateLocationPayload,
    ) -> Result<Option<Location>, AppError> {
        let (set_address, address) = clearable(&payload.address);
        sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations SET
                code = COALESCE($2, code),
                name = COALESCE($3, name),
                address = CASE WHEN $4 THEN $5::text ELSE address END,
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.code.as_deref().map(str::trim))
        .bind(payload.name.as_deref().map(str::trim))
        .bind(set_address)
        .bind(address)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A location with this code"))
    }

    // ---
    // Vendors
    // ---

    pub async fn list_vendors(&self, query: &CatalogQuery) -> Result<Vec<Vendor>, AppError> {
        let vendors = sqlx::query_as::<_, Vendor>(
            r#"
            SELECT * FROM vendors
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2 OR is_active)
            ORDER BY name ASC
            "#,
        )
        .bind(query.search.as_deref())
        .bind(query.include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(vendors)
    }

    pub async fn find_vendor<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Vendor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(vendor)
    }

    pub async fn create_vendor(&self, payload: &CreateVendorPayload) -> Result<Vendor, AppError> {
        sqlx::query_as::<_, Vendor>(
            r#"
            INSERT INTO vendors (name, email, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.address.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A vendor with this name"))
    }

    pub async fn update_vendor(
        &self,
        id: Uuid,
        payload: &UpdateVendorPayload,
    ) -> Result<Option<Vendor>, AppError> {
        let (set_email, email) = clearable(&payload.email);
        let (set_phone, phone) = clearable(&payload.phone);
        let (set_address, address) = clearable(&payload.address);
        sqlx::query_as::<_, Vendor>(
            r#"
            UPDATE vendors SET
                name = COALESCE($2, name),
                email = CASE WHEN $3 THEN $4::text ELSE email END,
                phone = CASE WHEN $5 THEN $6::text ELSE phone END,
                address = CASE WHEN $7 THEN $8::text ELSE address END,
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(set_email)
        .bind(email)
        .bind(set_phone)
        .bind(phone)
        .bind(set_address)
        .bind(address)
        .bind(payload.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "A vendor with this name"))
    }

    // ---
    // Deletion
    // ---

    /// Hard-deletes the row, or deactivates it when stock, documents or
    /// history still point at it. `None` when the id does not exist.
    pub async fn delete_or_deactivate(
        &self,
        table: CatalogTable,
        id: Uuid,
    ) -> Result<Option<DeleteOutcome>, AppError> {
        let delete_sql = format!("DELETE FROM {} WHERE id = $1", table.name());
        match sqlx::query(&delete_sql).bind(id).execute(&self.pool).await {
            Ok(result) if result.rows_affected() == 0 => Ok(None),
            Ok(_) => Ok(Some(DeleteOutcome::Deleted)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                let update_sql = format!(
                    "UPDATE {} SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
                    table.name()
                );
                sqlx::query(&update_sql).bind(id).execute(&self.pool).await?;
                Ok(Some(DeleteOutcome::Deactivated))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Products,
    Locations,
    Vendors,
}

impl CatalogTable {
    fn name(self) -> &'static str {
        match self {
            CatalogTable::Products => "products",
            CatalogTable::Locations => "locations",
            CatalogTable::Vendors => "vendors",
        }
    }
}
