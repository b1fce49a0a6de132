use chrono::{DateTime, Utc};
use serde::Serialize;

use stockbridge_core::{DomainError, DomainResult, WarehouseId};

/// A storage location referenced by stock rows.
///
/// `code` is a store-assigned, monotonically increasing number used only for
/// SKU formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub code: i64,
    pub warehouse_name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Warehouse creation/update input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWarehouse {
    pub warehouse_name: String,
    pub location: String,
}

impl NewWarehouse {
    pub fn validate(&self) -> DomainResult<()> {
        if self.warehouse_name.trim().is_empty() {
            return Err(DomainError::validation("warehouse_name is required"));
        }
        Ok(())
    }
}

/// Outcome of an atomic "delete unless referenced" attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseDeletion {
    Deleted,
    NotFound,
    /// Live stock rows still point at the warehouse.
    Referenced(u64),
}
