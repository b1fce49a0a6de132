use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbridge_core::{CompanyId, DomainError, DomainResult, ProductId, WarehouseId};

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Deleted,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "deleted" => Ok(ProductStatus::Deleted),
            other => Err(DomainError::validation(format!("unknown product status '{other}'"))),
        }
    }
}

/// A product offered by a supplier company.
///
/// The SKU is generated once at registration and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub description: String,
    pub supplier_id: CompanyId,
    /// Unit price in cents; a two-decimal number on the wire.
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub price: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn register(new: &NewProduct, supplier_id: CompanyId, sku: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::new(),
            product_name: new.product_name.clone(),
            sku,
            description: new.description.clone(),
            supplier_id,
            price: new.price,
            status: ProductStatus::Active,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn is_supplied_by(&self, company_id: CompanyId) -> bool {
        self.supplier_id == company_id
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active && self.deleted_at.is_none()
    }

    /// Apply an update. The SKU is deliberately not part of [`ProductUpdate`].
    pub fn apply_update(&mut self, update: &ProductUpdate) {
        self.product_name = update.product_name.clone();
        self.description = update.description.clone();
        self.price = update.price;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.status = ProductStatus::Deleted;
        self.deleted_at = Some(now);
    }
}

/// Where a newly registered product is stocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseChoice {
    Existing(WarehouseId),
    New { name: String, location: String },
}

/// Product registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub product_name: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    pub warehouse: WarehouseChoice,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.product_name, self.price, self.quantity)?;
        if let WarehouseChoice::New { name, .. } = &self.warehouse {
            if name.trim().is_empty() {
                return Err(DomainError::validation("New warehouse name is required"));
            }
        }
        Ok(())
    }
}

/// Product update input (name, description, price, stock level, optional move).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    pub product_name: String,
    pub description: String,
    pub price: i64,
    pub quantity: i64,
    pub warehouse_id: Option<WarehouseId>,
}

impl ProductUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        validate_fields(&self.product_name, self.price, self.quantity)
    }
}

fn validate_fields(name: &str, price: i64, quantity: i64) -> DomainResult<()> {
    if name.trim().is_empty() || price <= 0 {
        return Err(DomainError::validation(
            "Missing required product fields or invalid values",
        ));
    }
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(price: i64) -> NewProduct {
        NewProduct {
            product_name: "Bolt M8".to_string(),
            description: "zinc plated".to_string(),
            price,
            quantity: 100,
            warehouse: WarehouseChoice::Existing(WarehouseId::new()),
        }
    }

    #[test]
    fn rejects_non_positive_price() {
        assert!(new_product(0).validate().is_err());
        assert!(new_product(-5).validate().is_err());
        assert!(new_product(1).validate().is_ok());
    }

    #[test]
    fn new_warehouse_requires_a_name() {
        let mut p = new_product(100);
        p.warehouse = WarehouseChoice::New {
            name: "  ".to_string(),
            location: "Osaka".to_string(),
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn update_keeps_sku_and_supplier() {
        let supplier = CompanyId::new();
        let mut product = Product::register(&new_product(100), supplier, "WOS001-P001".to_string(), Utc::now());

        product.apply_update(&ProductUpdate {
            product_name: "Bolt M10".to_string(),
            description: String::new(),
            price: 250,
            quantity: 3,
            warehouse_id: None,
        });

        assert_eq!(product.sku, "WOS001-P001");
        assert_eq!(product.supplier_id, supplier);
        assert_eq!(product.price, 250);
        assert!(product.is_supplied_by(supplier));
    }

    #[test]
    fn soft_delete_deactivates() {
        let mut product = Product::register(&new_product(100), CompanyId::new(), "X".to_string(), Utc::now());
        product.soft_delete(Utc::now());
        assert!(!product.is_active());
        assert_eq!(product.status, ProductStatus::Deleted);
    }
}
