//! Order placement: turns requested lines into an order with price snapshots.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockbridge_core::{
    CompanyId, DomainError, DomainResult, OrderId, OrderItemId, ProductId, checked_sum, line_subtotal,
};

use crate::order::{Order, OrderItem, OrderStatus};

/// A requested line as submitted by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A requested line resolved against the catalog at order time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub supplier_id: CompanyId,
    pub quantity: i64,
    pub unit_price: i64,
}

impl Order {
    /// Build a new `Pending` order from resolved lines.
    ///
    /// Fails without producing anything if any line is the buyer's own product,
    /// has a non-positive quantity, or the total overflows.
    pub fn place(buyer: CompanyId, lines: &[PricedLine], now: DateTime<Utc>) -> DomainResult<Order> {
        if lines.is_empty() {
            return Err(DomainError::validation("Order must contain at least one item"));
        }

        let order_id = OrderId::new();
        let mut items = Vec::with_capacity(lines.len());
        let mut subtotals = Vec::with_capacity(lines.len());

        for line in lines {
            if line.quantity <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if line.supplier_id == buyer {
                return Err(DomainError::invariant("cannot order own product"));
            }
            subtotals.push(line_subtotal(line.unit_price, line.quantity)?);
            items.push(OrderItem {
                id: OrderItemId::new(),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price,
            });
        }

        Ok(Order {
            id: order_id,
            company_id: buyer,
            total: checked_sum(subtotals)?,
            status: OrderStatus::Pending,
            order_date: now,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(supplier: CompanyId, quantity: i64, unit_price: i64) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(),
            supplier_id: supplier,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn two_lines_total_and_start_pending() {
        let seller = CompanyId::new();
        let order = Order::place(
            CompanyId::new(),
            &[line(seller, 2, 1000), line(seller, 1, 500)],
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.total, 2500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.order_id == order.id));
        assert_eq!(order.items[0].price, 1000);
    }

    #[test]
    fn own_product_rejects_the_whole_order() {
        let buyer = CompanyId::new();
        let err = Order::place(buyer, &[line(CompanyId::new(), 1, 10), line(buyer, 1, 10)], Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_empty_and_non_positive_quantities() {
        let buyer = CompanyId::new();
        assert!(Order::place(buyer, &[], Utc::now()).is_err());
        assert!(Order::place(buyer, &[line(CompanyId::new(), 0, 10)], Utc::now()).is_err());
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let seller = CompanyId::new();
        let err = Order::place(
            CompanyId::new(),
            &[line(seller, 1, i64::MAX), line(seller, 1, 1)],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #[test]
        fn total_is_sum_of_line_subtotals(lines in prop::collection::vec((1i64..1_000, 1i64..1_000_000), 1..20)) {
            let seller = CompanyId::new();
            let priced: Vec<_> = lines.iter().map(|(q, p)| line(seller, *q, *p)).collect();
            let order = Order::place(CompanyId::new(), &priced, Utc::now()).unwrap();

            let expected: i64 = lines.iter().map(|(q, p)| q * p).sum();
            prop_assert_eq!(order.total, expected);
            let from_items: i64 = order.items.iter().map(|i| i.subtotal().unwrap()).sum();
            prop_assert_eq!(order.total, from_items);
        }
    }
}
