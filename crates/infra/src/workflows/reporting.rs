//! Read-only rollups.

use tracing::instrument;

use stockbridge_core::CompanyId;
use stockbridge_orders::CostSummary;

use super::WorkflowResult;
use crate::store::Store;

/// Spend and earnings for `company_id`, computed fresh on every call.
#[instrument(skip(store), fields(company_id = %company_id), err)]
pub async fn cost_summary(store: &dyn Store, company_id: CompanyId) -> WorkflowResult<CostSummary> {
    Ok(store.cost_summary(company_id).await?)
}
