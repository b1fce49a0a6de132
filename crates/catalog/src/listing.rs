use serde::Serialize;

use stockbridge_core::{CompanyId, ProductId, WarehouseId};

/// Product row as shown in catalog and purchase listings: product joined with
/// its stock row, warehouse and supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub product_name: String,
    pub sku: String,
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub price: i64,
    pub quantity: i64,
    pub description: String,
    pub warehouse: Option<String>,
    pub warehouse_id: Option<WarehouseId>,
    pub supplier_id: CompanyId,
    pub supplier_name: Option<String>,
}
