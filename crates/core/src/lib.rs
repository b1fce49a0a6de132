//! `stockbridge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, OrderId, OrderItemId, PermissionRequestId, ProductId, WarehouseId};
pub use money::{cents_from_decimal, checked_sum, decimal_from_cents, line_subtotal};
