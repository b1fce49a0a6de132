use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto::WhoAmIResponse;
use crate::context::CompanyContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn protected(Extension(company): Extension<CompanyContext>) -> impl IntoResponse {
    Json(WhoAmIResponse {
        message: "This is a protected route".to_string(),
        email: company.email().to_string(),
        company_id: company.company_id(),
    })
}
