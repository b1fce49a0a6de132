use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use stockbridge_catalog::ProductUpdate;
use stockbridge_core::ProductId;
use stockbridge_infra::workflows::catalog;

use crate::app::dto::{self, MessageResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match catalog::list_own_products(services.store.as_ref(), company.company_id()).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

/// Products the caller may buy: those of sellers that permitted it.
pub async fn list_purchase_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match catalog::list_purchasable_products(services.store.as_ref(), company.company_id()).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let new = match body.into_new_product() {
        Ok(n) => n,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
    };

    match catalog::create_product(services.store.as_ref(), company.company_id(), new, Utc::now()).await {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match catalog::get_product(services.store.as_ref(), company.company_id(), id).await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let update = match errors::json_body(body).and_then(|b| {
        ProductUpdate::try_from(b)
            .map_err(|msg: String| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg))
    }) {
        Ok(u) => u,
        Err(res) => return res,
    };

    match catalog::update_product(services.store.as_ref(), company.company_id(), id, update).await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match catalog::delete_product(services.store.as_ref(), company.company_id(), id, Utc::now()).await {
        Ok(()) => Json(MessageResponse::new("Product deleted successfully")).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
