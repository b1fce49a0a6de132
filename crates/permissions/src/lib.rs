//! Cross-company purchase permissions.
//!
//! A requester company asks a seller (found by email) for access to its
//! catalog; only the seller may permit or reject. Pure domain logic.

pub mod request;
pub mod visibility;

pub use request::{PermissionRequest, PermissionStatus, RequestFilter};
pub use visibility::PurchaseVisibility;
