use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockbridge_infra::WorkflowError;

pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    match err {
        WorkflowError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        WorkflowError::UnknownReference(msg) => json_error(StatusCode::BAD_REQUEST, "unknown_reference", msg),
        WorkflowError::Conflict(msg) => json_error(StatusCode::BAD_REQUEST, "state_conflict", msg),
        WorkflowError::Unauthenticated(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", msg),
        WorkflowError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        WorkflowError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        WorkflowError::Duplicate(msg) => json_error(StatusCode::CONFLICT, "duplicate", msg),
        WorkflowError::Store(e) => {
            error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Internal server error")
        }
        WorkflowError::Internal(msg) => {
            error!(error = %msg, "internal failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}

/// Unwrap a JSON body, turning extractor rejections into the usual error shape.
pub fn json_body<T>(
    body: Result<axum::Json<T>, JsonRejection>,
) -> Result<T, axum::response::Response> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text()))
}

/// Parse a path identifier or produce a 400.
pub fn parse_id<T: core::str::FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("Invalid {what} id")))
}
