use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbridge_catalog::{NewProduct, NewWarehouse, ProductUpdate, WarehouseChoice};
use stockbridge_core::{CompanyId, WarehouseId, cents_from_decimal};
use stockbridge_orders::LineRequest;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Either `warehouse_id` or `new_warehouse_name` (+ optional location).
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal amount, at most two places.
    pub price: Decimal,
    pub quantity: i64,
    pub warehouse_id: Option<WarehouseId>,
    pub new_warehouse_name: Option<String>,
    pub new_warehouse_location: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, String> {
        let price = cents_from_decimal(self.price).map_err(|e| e.to_string())?;
        let warehouse = match (self.warehouse_id, self.new_warehouse_name) {
            (Some(id), None) => WarehouseChoice::Existing(id),
            (None, Some(name)) => WarehouseChoice::New {
                name,
                location: self.new_warehouse_location.unwrap_or_default(),
            },
            (Some(_), Some(_)) => {
                return Err("Provide either warehouse_id or new_warehouse_name, not both".to_string());
            }
            (None, None) => return Err("A warehouse is required".to_string()),
        };
        Ok(NewProduct {
            product_name: self.product_name,
            description: self.description,
            price,
            quantity: self.quantity,
            warehouse,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i64,
    pub warehouse_id: Option<WarehouseId>,
}

impl TryFrom<UpdateProductRequest> for ProductUpdate {
    type Error = String;

    fn try_from(body: UpdateProductRequest) -> Result<Self, Self::Error> {
        Ok(ProductUpdate {
            product_name: body.product_name,
            description: body.description,
            price: cents_from_decimal(body.price).map_err(|e| e.to_string())?,
            quantity: body.quantity,
            warehouse_id: body.warehouse_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WarehouseRequest {
    pub warehouse_name: String,
    #[serde(default)]
    pub location: String,
}

impl From<WarehouseRequest> for NewWarehouse {
    fn from(body: WarehouseRequest) -> Self {
        NewWarehouse {
            warehouse_name: body.warehouse_name,
            location: body.location,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<LineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    #[serde(default)]
    pub seller_email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequestBody {
    #[serde(default)]
    pub status: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub message: String,
    pub email: String,
    pub company_id: CompanyId,
}
