//! Order placement and fulfilment.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use stockbridge_core::{CompanyId, OrderId};
use stockbridge_orders::{LineRequest, Order, OrderTransition, PricedLine};

use super::{WorkflowError, WorkflowResult, acting_company};
use crate::store::Store;

/// Place an order for `buyer`, snapshotting current product prices.
///
/// Either every line resolves and the whole order is stored, or nothing is.
#[instrument(skip(store, lines, now), fields(company_id = %buyer, line_count = lines.len()), err)]
pub async fn create_order(
    store: &dyn Store,
    buyer: CompanyId,
    lines: &[LineRequest],
    now: DateTime<Utc>,
) -> WorkflowResult<Order> {
    if lines.is_empty() {
        return Err(WorkflowError::Validation("Order must contain at least one item".to_string()));
    }
    acting_company(store, buyer).await?;

    let ids: Vec<_> = lines.iter().map(|l| l.product_id).collect::<HashSet<_>>().into_iter().collect();
    let products: HashMap<_, _> = store
        .get_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            WorkflowError::UnknownReference(format!("Product {} not found", line.product_id))
        })?;
        priced.push(PricedLine {
            product_id: product.id,
            supplier_id: product.supplier_id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let order = Order::place(buyer, &priced, now).inspect_err(|e| warn!(error = %e, "order rejected"))?;
    store.insert_order(&order).await?;
    info!(order_id = %order.id, total = order.total, "order placed");
    Ok(order)
}

#[instrument(skip(store), fields(company_id = %buyer), err)]
pub async fn list_orders(store: &dyn Store, buyer: CompanyId) -> WorkflowResult<Vec<Order>> {
    Ok(store.list_orders_for_buyer(buyer).await?)
}

/// Orders containing at least one item supplied by `seller`.
#[instrument(skip(store), fields(company_id = %seller), err)]
pub async fn list_sales_orders(store: &dyn Store, seller: CompanyId) -> WorkflowResult<Vec<Order>> {
    Ok(store.list_orders_for_supplier(seller).await?)
}

/// Move an order one step forward.
///
/// The caller must be the buyer or supply at least one of its items. The
/// status check and the write are a single conditional update, so of two
/// concurrent identical advances exactly one succeeds.
#[instrument(skip(store), fields(company_id = %caller, order_id = %order_id, transition = transition.as_str()), err)]
pub async fn advance_order(
    store: &dyn Store,
    caller: CompanyId,
    order_id: OrderId,
    transition: OrderTransition,
) -> WorkflowResult<Order> {
    let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Order not found".to_string()))?;

    if order.company_id != caller {
        let product_ids: Vec<_> = order.items.iter().map(|i| i.product_id).collect();
        let suppliers = store.product_suppliers(&product_ids).await?;
        if !suppliers.values().any(|s| *s == caller) {
            warn!("order transition rejected: caller is not a participant");
            return Err(WorkflowError::Forbidden(
                "Not authorized to update this order".to_string(),
            ));
        }
    }

    // Early check for the message; the conditional update is authoritative.
    let next = transition.guard(order.status)?;

    match store
        .advance_order_status(order_id, transition.from_status(), next)
        .await?
    {
        Some(updated) => {
            info!(status = updated.status.as_str(), "order advanced");
            Ok(updated)
        }
        None => {
            warn!("order transition lost a race");
            Err(WorkflowError::Conflict(format!(
                "Order is not in {} status",
                transition.from_status().as_str()
            )))
        }
    }
}
