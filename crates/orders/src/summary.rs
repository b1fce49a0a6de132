use serde::Serialize;

use stockbridge_core::{CompanyId, DomainResult, ProductId, checked_sum};

use crate::order::Order;

/// Spend and earnings rollup for one company, split by whether the order is
/// `Completed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub completed_spent: i64,
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub pending_spent: i64,
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub completed_earned: i64,
    #[serde(with = "stockbridge_core::money::decimal_amount")]
    pub pending_earned: i64,
}

impl CostSummary {
    /// Compute from a full set of orders.
    ///
    /// Spending uses order totals of orders placed by `company`. Earnings use
    /// the snapshot subtotals of items whose product `supplier_of` maps to
    /// `company`.
    pub fn compute<F>(company: CompanyId, orders: &[Order], supplier_of: F) -> DomainResult<Self>
    where
        F: Fn(ProductId) -> Option<CompanyId>,
    {
        let mut completed_spent = Vec::new();
        let mut pending_spent = Vec::new();
        let mut completed_earned = Vec::new();
        let mut pending_earned = Vec::new();

        for order in orders {
            let done = order.status.is_completed();
            if order.company_id == company {
                if done {
                    completed_spent.push(order.total);
                } else {
                    pending_spent.push(order.total);
                }
            }
            for item in &order.items {
                if supplier_of(item.product_id) != Some(company) {
                    continue;
                }
                let subtotal = item.subtotal()?;
                if done {
                    completed_earned.push(subtotal);
                } else {
                    pending_earned.push(subtotal);
                }
            }
        }

        Ok(Self {
            completed_spent: checked_sum(completed_spent)?,
            pending_spent: checked_sum(pending_spent)?,
            completed_earned: checked_sum(completed_earned)?,
            pending_earned: checked_sum(pending_earned)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderStatus, OrderTransition};
    use crate::pricing::PricedLine;
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn no_orders_is_all_zeros() {
        let summary = CostSummary::compute(CompanyId::new(), &[], |_| None).unwrap();
        assert_eq!(summary, CostSummary::default());
    }

    #[test]
    fn splits_buyer_and_seller_sides_by_completion() {
        let (buyer, seller) = (CompanyId::new(), CompanyId::new());
        let (p1, p2) = (ProductId::new(), ProductId::new());
        let suppliers: HashMap<_, _> = [(p1, seller), (p2, seller)].into_iter().collect();

        let open = Order::place(
            buyer,
            &[PricedLine { product_id: p1, supplier_id: seller, quantity: 2, unit_price: 1000 }],
            Utc::now(),
        )
        .unwrap();
        let mut done = Order::place(
            buyer,
            &[PricedLine { product_id: p2, supplier_id: seller, quantity: 1, unit_price: 500 }],
            Utc::now(),
        )
        .unwrap();
        for t in OrderTransition::ALL {
            done.advance(t).unwrap();
        }
        assert_eq!(done.status, OrderStatus::Completed);

        let orders = vec![open, done];
        let lookup = |p: ProductId| suppliers.get(&p).copied();

        let bought = CostSummary::compute(buyer, &orders, lookup).unwrap();
        assert_eq!(bought.pending_spent, 2000);
        assert_eq!(bought.completed_spent, 500);
        assert_eq!(bought.pending_earned, 0);

        let sold = CostSummary::compute(seller, &orders, lookup).unwrap();
        assert_eq!(sold.pending_earned, 2000);
        assert_eq!(sold.completed_earned, 500);
        assert_eq!(sold.completed_spent, 0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(CostSummary::default()).unwrap();
        assert!(json.get("completedSpent").is_some());
        assert!(json.get("pendingEarned").is_some());
    }

    #[test]
    fn amounts_serialize_as_decimals() {
        let summary = CostSummary {
            completed_spent: 2500,
            pending_spent: 1050,
            ..CostSummary::default()
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["completedSpent"], 25.0);
        assert_eq!(json["pendingSpent"], 10.5);
        assert_eq!(json["completedEarned"], 0.0);
    }
}
