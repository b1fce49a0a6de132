use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use stockbridge_core::PermissionRequestId;
use stockbridge_infra::workflows::permissions;
use stockbridge_permissions::RequestFilter;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_requests).post(send_request))
        .route("/search", get(search_requests))
        .route("/:request_id", put(update_request))
}

pub async fn send_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    body: Result<Json<dto::SendRequestBody>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match permissions::request_permission(
        services.store.as_ref(),
        company.company_id(),
        &body.seller_email,
        Utc::now(),
    )
    .await
    {
        Ok(request) => Json(request).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Requests addressed to the caller.
pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match permissions::list_requests(services.store.as_ref(), company.company_id()).await {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn search_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(filter): Query<RequestFilter>,
) -> axum::response::Response {
    match permissions::search_requests(services.store.as_ref(), company.company_id(), filter).await {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(request_id): Path<String>,
    body: Result<Json<dto::UpdateRequestBody>, JsonRejection>,
) -> axum::response::Response {
    let request_id: PermissionRequestId = match errors::parse_id(&request_id, "request") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match permissions::update_request(services.store.as_ref(), company.company_id(), request_id, &body.status).await {
        Ok(request) => Json(request).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
