use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use stockbridge_companies::Registration;
use stockbridge_infra::workflows::companies;

use crate::app::dto::LoginRequest;
use crate::app::errors;
use crate::app::services::AppServices;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> axum::response::Response {
    let registration = match errors::json_body(body) {
        Ok(r) => r,
        Err(res) => return res,
    };

    match companies::register(services.store.as_ref(), registration, Utc::now()).await {
        Ok((profile, reactivated)) => {
            let message = if reactivated {
                "Account reactivated successfully"
            } else {
                "Company registered successfully"
            };
            (
                StatusCode::CREATED,
                Json(json!({ "message": message, "company": profile })),
            )
                .into_response()
        }
        Err(e) => errors::workflow_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };

    let outcome = match companies::login(
        services.store.as_ref(),
        services.tokens.as_ref(),
        &body.email,
        &body.password,
        Utc::now(),
    )
    .await
    {
        Ok(o) => o,
        Err(e) => return errors::workflow_error_to_response(e),
    };

    let cookie = services.session_cookie(&outcome.token);
    ([(header::SET_COOKIE, cookie)], Json(outcome)).into_response()
}
