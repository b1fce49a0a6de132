//! Catalog domain module: products, warehouses and the stock rows joining them.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Persistence lives in
//! `stockbridge-infra`.

pub mod listing;
pub mod product;
pub mod sku;
pub mod stock;
pub mod warehouse;

pub use listing::ProductListing;
pub use product::{NewProduct, Product, ProductStatus, ProductUpdate, WarehouseChoice};
pub use sku::generate_sku;
pub use stock::InventoryStock;
pub use warehouse::{NewWarehouse, Warehouse, WarehouseDeletion};
