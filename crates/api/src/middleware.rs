use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use stockbridge_auth::TokenValidator;
use stockbridge_infra::store::SharedStore;
use stockbridge_infra::workflows::acting_company;

use crate::app::errors::{json_error, workflow_error_to_response};
use crate::context::CompanyContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenValidator>,
    pub store: SharedStore,
    pub cookie_name: Arc<str>,
}

/// Require a valid session token (cookie first, then `Authorization: Bearer`)
/// for a company that is still active, and attach a [`CompanyContext`] to the
/// request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = || json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "Unauthorized");

    let token = extract_token(req.headers(), &state.cookie_name).ok_or_else(unauthorized)?;
    let claims = state.tokens.validate(token, Utc::now()).map_err(|e| {
        debug!(error = %e, "session token rejected");
        unauthorized()
    })?;

    acting_company(state.store.as_ref(), claims.company_id)
        .await
        .map_err(|e| {
            debug!(company_id = %claims.company_id, error = %e, "session company rejected");
            workflow_error_to_response(e)
        })?;

    req.extensions_mut()
        .insert(CompanyContext::new(claims.company_id, claims.email));

    Ok(next.run(req).await)
}

pub fn extract_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    extract_cookie(headers, cookie_name).or_else(|| extract_bearer(headers))
}

fn extract_cookie<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
