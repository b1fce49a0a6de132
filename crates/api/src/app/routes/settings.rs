use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use stockbridge_companies::{PasswordChange, ProfileUpdate};
use stockbridge_infra::workflows::companies;

use crate::app::dto::MessageResponse;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::CompanyContext;

pub async fn get_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match companies::profile(services.store.as_ref(), company.company_id()).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> axum::response::Response {
    let update = match errors::json_body(body) {
        Ok(u) => u,
        Err(res) => return res,
    };

    match companies::update_profile(services.store.as_ref(), company.company_id(), update).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    body: Result<Json<PasswordChange>, JsonRejection>,
) -> axum::response::Response {
    let change = match errors::json_body(body) {
        Ok(c) => c,
        Err(res) => return res,
    };

    match companies::change_password(services.store.as_ref(), company.company_id(), change).await {
        Ok(()) => Json(MessageResponse::new("Password updated successfully")).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match companies::delete_account(services.store.as_ref(), company.company_id(), Utc::now()).await {
        Ok(()) => Json(MessageResponse::new("Account deleted successfully")).into_response(),
        Err(e) => errors::workflow_error_to_response(e),
    }
}
