//! Persistence abstractions.
//!
//! One trait per aggregate family, plus the umbrella [`Store`] that workflows
//! and the API hold as `Arc<dyn Store>`. Every method that writes more than one
//! row is atomic: either all rows land or none do.
//!
//! Implementations:
//! - [`InMemoryStore`]: `RwLock`-guarded tables for tests/dev.
//! - [`PostgresStore`]: sqlx/Postgres with transactions.

mod in_memory;
mod postgres;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockbridge_catalog::{
    NewProduct, NewWarehouse, Product, ProductListing, ProductUpdate, Warehouse, WarehouseDeletion,
};
use stockbridge_companies::Company;
use stockbridge_core::{CompanyId, OrderId, PermissionRequestId, ProductId, WarehouseId};
use stockbridge_orders::{CostSummary, Order, OrderStatus};
use stockbridge_permissions::{PermissionRequest, PermissionStatus};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A row referenced by the write does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored data could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Connection, query or transaction failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Look up by email regardless of status (soft-deleted rows included).
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>>;

    async fn get_company(&self, id: CompanyId) -> StoreResult<Option<Company>>;

    /// Fails with `Duplicate` if the email is already held.
    async fn insert_company(&self, company: &Company) -> StoreResult<()>;

    /// Overwrite every mutable column. Fails with `Duplicate` if the email
    /// collides with another company.
    async fn update_company(&self, company: &Company) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a warehouse and assign the next `code`.
    async fn insert_warehouse(&self, new: &NewWarehouse, now: DateTime<Utc>) -> StoreResult<Warehouse>;

    async fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Option<Warehouse>>;

    async fn list_warehouses(&self) -> StoreResult<Vec<Warehouse>>;

    async fn update_warehouse(&self, id: WarehouseId, update: &NewWarehouse) -> StoreResult<Option<Warehouse>>;

    /// Soft-delete unless a live stock row references it. The check and the
    /// delete happen atomically.
    async fn delete_warehouse_if_unreferenced(
        &self,
        id: WarehouseId,
        now: DateTime<Utc>,
    ) -> StoreResult<WarehouseDeletion>;

    /// Register a product: create the warehouse if asked to, derive the SKU
    /// from the warehouse, and store product + stock row as one unit.
    ///
    /// Fails with `NotFound` if an existing warehouse was named and is missing.
    async fn create_product(
        &self,
        new: &NewProduct,
        supplier_id: CompanyId,
        now: DateTime<Utc>,
    ) -> StoreResult<Product>;

    /// Active product by id.
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Active products among `ids`. Missing or deleted ids are simply absent.
    async fn get_products(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    /// Supplier of every known product among `ids`, deleted ones included.
    async fn product_suppliers(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, CompanyId>>;

    async fn get_product_listing(&self, id: ProductId) -> StoreResult<Option<ProductListing>>;

    /// Active listings of the given suppliers.
    async fn list_products_by_suppliers(&self, suppliers: &[CompanyId]) -> StoreResult<Vec<ProductListing>>;

    /// Update product fields and its stock row as one unit. Fails with
    /// `NotFound` if the product or the target warehouse is missing.
    async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> StoreResult<Product>;

    /// Soft-delete the product and its stock row. Returns false if it was not active.
    async fn soft_delete_product(&self, id: ProductId, now: DateTime<Utc>) -> StoreResult<bool>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn insert_permission_request(&self, request: &PermissionRequest) -> StoreResult<()>;

    async fn get_permission_request(&self, id: PermissionRequestId) -> StoreResult<Option<PermissionRequest>>;

    async fn list_requests_for_seller(&self, seller_id: CompanyId) -> StoreResult<Vec<PermissionRequest>>;

    async fn list_requests_by_requester(&self, requester_id: CompanyId) -> StoreResult<Vec<PermissionRequest>>;

    async fn set_permission_status(
        &self,
        id: PermissionRequestId,
        status: PermissionStatus,
    ) -> StoreResult<Option<PermissionRequest>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order together with all of its items.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn list_orders_for_buyer(&self, buyer_id: CompanyId) -> StoreResult<Vec<Order>>;

    /// Distinct orders with at least one item supplied by `supplier_id`.
    async fn list_orders_for_supplier(&self, supplier_id: CompanyId) -> StoreResult<Vec<Order>>;

    /// Conditional status update. Returns `None` when the order is not in
    /// `expected`; two racing callers can never both succeed.
    async fn advance_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>>;

    async fn cost_summary(&self, company_id: CompanyId) -> StoreResult<CostSummary>;
}

/// Everything the application needs from persistence.
pub trait Store: CompanyStore + CatalogStore + PermissionStore + OrderStore {}

impl<T> Store for T where T: CompanyStore + CatalogStore + PermissionStore + OrderStore {}

/// Shared handle used by the API and workflows.
pub type SharedStore = Arc<dyn Store>;
