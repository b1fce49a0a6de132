use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::Utc;

use stockbridge_core::OrderId;
use stockbridge_infra::workflows::{orders, reporting};
use stockbridge_orders::OrderTransition;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id/accept", put(accept_order))
        .route("/:id/deliver", put(deliver_order))
        .route("/:id/complete", put(complete_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match orders::create_order(services.store.as_ref(), company.company_id(), &body.items, Utc::now()).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match orders::list_orders(services.store.as_ref(), company.company_id()).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Orders containing the caller's products.
pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match orders::list_sales_orders(services.store.as_ref(), company.company_id()).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn cost_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match reporting::cost_summary(services.store.as_ref(), company.company_id()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn accept_order(
    services: Extension<Arc<AppServices>>,
    company: Extension<CompanyContext>,
    id: Path<String>,
) -> axum::response::Response {
    advance(services, company, id, OrderTransition::Accept).await
}

pub async fn deliver_order(
    services: Extension<Arc<AppServices>>,
    company: Extension<CompanyContext>,
    id: Path<String>,
) -> axum::response::Response {
    advance(services, company, id, OrderTransition::Deliver).await
}

pub async fn complete_order(
    services: Extension<Arc<AppServices>>,
    company: Extension<CompanyContext>,
    id: Path<String>,
) -> axum::response::Response {
    advance(services, company, id, OrderTransition::Complete).await
}

async fn advance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    transition: OrderTransition,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match orders::advance_order(services.store.as_ref(), company.company_id(), id, transition).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
