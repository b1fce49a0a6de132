use serde::Serialize;

use stockbridge_core::{ProductId, WarehouseId};

/// Stock level of a product in a warehouse.
///
/// In practice there is one live row per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStock {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity_in_stock: i64,
}

impl InventoryStock {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId, quantity_in_stock: i64) -> Self {
        Self {
            product_id,
            warehouse_id,
            quantity_in_stock,
        }
    }
}
