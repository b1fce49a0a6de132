//! Purchase orders: placement with price snapshots, the fulfilment status
//! machine, and cost/earnings rollups.

pub mod order;
pub mod pricing;
pub mod summary;

pub use order::{Order, OrderItem, OrderStatus, OrderTransition};
pub use pricing::{LineRequest, PricedLine};
pub use summary::CostSummary;
