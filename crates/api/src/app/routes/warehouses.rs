use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use stockbridge_core::WarehouseId;
use stockbridge_infra::workflows::catalog;

use crate::app::dto::{self, MessageResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route(
            "/:id",
            get(get_warehouse).put(update_warehouse).delete(delete_warehouse),
        )
}

pub async fn list_warehouses(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match catalog::list_warehouses(services.store.as_ref()).await {
        Ok(warehouses) => Json(warehouses).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::WarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match catalog::create_warehouse(services.store.as_ref(), body.into(), Utc::now()).await {
        Ok(warehouse) => (StatusCode::CREATED, Json(warehouse)).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match catalog::get_warehouse(services.store.as_ref(), id).await {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::WarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(id) => id,
        Err(res) => return res,
    };
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match catalog::update_warehouse(services.store.as_ref(), id, body.into()).await {
        Ok(warehouse) => Json(warehouse).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match errors::parse_id(&id, "warehouse") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match catalog::delete_warehouse(services.store.as_ref(), id, Utc::now()).await {
        Ok(()) => Json(MessageResponse::new("Warehouse deleted successfully")).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
