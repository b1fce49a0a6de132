//! Permission request workflow.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use stockbridge_companies::Company;
use stockbridge_core::{CompanyId, PermissionRequestId};
use stockbridge_permissions::{PermissionRequest, PermissionStatus, RequestFilter};

use super::{WorkflowError, WorkflowResult, acting_company};
use crate::store::Store;

/// Ask the company registered under `seller_email` for purchase access.
///
/// The requester's current email and phone are copied into the request.
#[instrument(skip(store, now), fields(company_id = %requester_id), err)]
pub async fn request_permission(
    store: &dyn Store,
    requester_id: CompanyId,
    seller_email: &str,
    now: DateTime<Utc>,
) -> WorkflowResult<PermissionRequest> {
    let seller_email = seller_email.trim();
    if seller_email.is_empty() {
        return Err(WorkflowError::Validation("Seller email is required".to_string()));
    }

    let seller = store
        .find_company_by_email(seller_email)
        .await?
        .filter(Company::is_active)
        .ok_or_else(|| WorkflowError::UnknownReference("Seller with provided email not found".to_string()))?;
    let requester = acting_company(store, requester_id).await?;

    let request = PermissionRequest::open(requester.id, &requester.email, &requester.phone, seller.id, now)?;
    store.insert_permission_request(&request).await?;
    info!(request_id = %request.id, seller_id = %seller.id, "permission requested");
    Ok(request)
}

#[instrument(skip(store), fields(company_id = %seller_id), err)]
pub async fn list_requests(store: &dyn Store, seller_id: CompanyId) -> WorkflowResult<Vec<PermissionRequest>> {
    Ok(store.list_requests_for_seller(seller_id).await?)
}

#[instrument(skip(store, filter), fields(company_id = %seller_id), err)]
pub async fn search_requests(
    store: &dyn Store,
    seller_id: CompanyId,
    filter: RequestFilter,
) -> WorkflowResult<Vec<PermissionRequest>> {
    let filter = filter.normalized();
    let requests = store.list_requests_for_seller(seller_id).await?;
    Ok(requests.into_iter().filter(|r| filter.matches(r)).collect())
}

/// Seller decision on a request: `permitted` or `rejected`.
#[instrument(skip(store), fields(company_id = %seller_id, request_id = %request_id), err)]
pub async fn update_request(
    store: &dyn Store,
    seller_id: CompanyId,
    request_id: PermissionRequestId,
    status: &str,
) -> WorkflowResult<PermissionRequest> {
    let status = PermissionStatus::parse_decision(status)
        .map_err(|_| WorkflowError::Validation("Status must be 'permitted' or 'rejected'".to_string()))?;

    let mut request = store
        .get_permission_request(request_id)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Permission request not found".to_string()))?;
    if request.ensure_seller(seller_id).is_err() {
        warn!("permission update rejected: caller is not the seller");
        return Err(WorkflowError::Forbidden(
            "Not authorized to update this request".to_string(),
        ));
    }

    request.decide(status)?;
    let updated = store
        .set_permission_status(request.id, request.status)
        .await?
        .ok_or_else(|| WorkflowError::NotFound("Permission request not found".to_string()))?;
    info!(status = updated.status.as_str(), "permission request updated");
    Ok(updated)
}
