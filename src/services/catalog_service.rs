// src/services/catalog_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, InventoryRepository, catalog_repo::CatalogTable},
    models::{
        catalog::{
            CatalogQuery, CreateLocationPayload, CreateProductPayload, CreateVendorPayload,
            DeleteOutcome, Location, Product, UpdateLocationPayload, UpdateProductPayload,
            UpdateVendorPayload, Vendor,
        },
        inventory::{StockLevel, StockQuery},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
    inventory_repo: InventoryRepository,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository, inventory_repo: InventoryRepository) -> Self {
        Self { catalog_repo, inventory_repo }
    }

    // --- PRODUCTS ---

    pub async fn list_products(&self, query: &CatalogQuery) -> Result<Vec<Product>, AppError> {
        self.catalog_repo.list_products(query).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog_repo
            .find_product(self.pool(), id)
            .await?
            .ok_or(AppError::NotFound("Product"))
    }

    pub async fn create_product(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = self.catalog_repo.create_product(payload).await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "📦 Product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        self.catalog_repo
            .update_product(id, payload)
            .await?
            .ok_or(AppError::NotFound("Product"))
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<DeleteOutcome, AppError> {
        self.delete(CatalogTable::Products, id, "Product").await
    }

    /// Per-location stock for one product.
    pub async fn product_stock(&self, id: Uuid) -> Result<Vec<StockLevel>, AppError> {
        self.get_product(id).await?;
        let query = StockQuery { product_id: Some(id), ..Default::default() };
        self.inventory_repo.list_stock(&query).await
    }

    // --- LOCATIONS ---

    pub async fn list_locations(&self, query: &CatalogQuery) -> Result<Vec<Location>, AppError> {
        self.catalog_repo.list_locations(query).await
    }

    pub async fn get_location(&self, id: Uuid) -> Result<Location, AppError> {
        self.catalog_repo
            .find_location(self.pool(), id)
            .await?
            .ok_or(AppError::NotFound("Location"))
    }

    pub async fn create_location(&self, payload: &CreateLocationPayload) -> Result<Location, AppError> {
        let location = self.catalog_repo.create_location(payload).await?;
        tracing::info!(location_id = %location.id, code = %location.code, "🏬 Location created");
        Ok(location)
    }

    pub async fn update_location(&self, id: Uuid, payload: &UpdateLocationPayload) -> Result<Location, AppError> {
        self.catalog_repo
            .update_location(id, payload)
            .await?
            .ok_or(AppError::NotFound("Location"))
    }

    pub async fn delete_location(&self, id: Uuid) -> Result<DeleteOutcome, AppError> {
        self.delete(CatalogTable::Locations, id, "Location").await
    }

    // --- VENDORS ---

    pub async fn list_vendors(&self, query: &CatalogQuery) -> Result<Vec<Vendor>, AppError> {
        self.catalog_repo.list_vendors(query).await
    }

    pub async fn get_vendor(&self, id: Uuid) -> Result<Vendor, AppError> {
        self.catalog_repo
            .find_vendor(self.pool(), id)
            .await?
            .ok_or(AppError::NotFound("Vendor"))
    }

    pub async fn create_vendor(&self, payload: &CreateVendorPayload) -> Result<Vendor, AppError> {
        let vendor = self.catalog_repo.create_vendor(payload).await?;
        tracing::info!(vendor_id = %vendor.id, name = %vendor.name, "🚚 Vendor created");
        Ok(vendor)
    }

    pub async fn update_vendor(&self, id: Uuid, payload: &UpdateVendorPayload) -> Result<Vendor, AppError> {
        self.catalog_repo
            .update_vendor(id, payload)
            .await?
            .ok_or(AppError::NotFound("Vendor"))
    }

    pub async fn delete_vendor(&self, id: Uuid) -> Result<DeleteOutcome, AppError> {
        self.delete(CatalogTable::Vendors, id, "Vendor").await
    }

    async fn delete(&self, table: CatalogTable, id: Uuid, entity: &'static str) -> Result<DeleteOutcome, AppError> {
        let outcome = self
            .catalog_repo
            .delete_or_deactivate(table, id)
            .await?
            .ok_or(AppError::NotFound(entity))?;

        tracing::info!(%id, ?outcome, "{} removed", entity);
        Ok(outcome)
    }

    fn pool(&self) -> &sqlx::PgPool {
        self.catalog_repo.pool()
    }
}
