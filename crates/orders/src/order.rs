use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbridge_core::{CompanyId, DomainError, DomainResult, OrderId, OrderItemId, ProductId};

/// Order status lifecycle.
///
/// `Pending -> Processing -> Delivered -> Completed`. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processing" => Ok(OrderStatus::Processing),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }
}

/// A fulfilment step. Each step has exactly one predecessor and successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderTransition {
    Accept,
    Deliver,
    Complete,
}

impl OrderTransition {
    pub const ALL: [OrderTransition; 3] = [
        OrderTransition::Accept,
        OrderTransition::Deliver,
        OrderTransition::Complete,
    ];

    pub fn from_status(&self) -> OrderStatus {
        match self {
            OrderTransition::Accept => OrderStatus::Pending,
            OrderTransition::Deliver => OrderStatus::Processing,
            OrderTransition::Complete => OrderStatus::Delivered,
        }
    }

    pub fn to_status(&self) -> OrderStatus {
        match self {
            OrderTransition::Accept => OrderStatus::Processing,
            OrderTransition::Deliver => OrderStatus::Delivered,
            OrderTransition::Complete => OrderStatus::Completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderTransition::Accept => "accept",
            OrderTransition::Deliver => "deliver",
            OrderTransition::Complete => "complete",
        }
    }

    /// The single transition guard: `current` must be the step's predecessor.
    pub fn guard(&self, current: OrderStatus) -> DomainResult<OrderStatus> {
        if current != self.from_status() {
            return Err(DomainError::conflict(format!(
                "Order is not in {} status",
                self.from_status().as_str()
            )));
        }
        Ok(self.to_status())
    }
}

/// Immutable order line with the unit price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price snapshot in smallest currency unit.
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub price: i64,
}

impl OrderItem {
    pub fn subtotal(&self) -> DomainResult<i64> {
        stockbridge_core::line_subtotal(self.price, self.quantity)
    }
}

/// A buyer's purchase.
///
/// `total` is fixed when the order is placed and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub company_id: CompanyId,
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub total: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Apply a transition in place.
    pub fn advance(&mut self, transition: OrderTransition) -> DomainResult<()> {
        self.status = transition.guard(self.status)?;
        Ok(())
    }
}
