//! Authentication middleware
//!
//! Resolves the caller from a bearer token or the back-office token cookie
//! and attaches an [`AuthUser`] to the request.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use backoffice_shared::Capability;

use super::jwt::{Grants, JwtError, JwtManager};
use crate::error::ApiError;

pub const TOKEN_COOKIE: &str = "backoffice_token";

/// Authenticated back-office employee
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: i64,
    pub email: String,
    pub grants: Grants,
}

impl AuthUser {
    /// True when every capability is granted on `resource`
    pub fn is_granted(&self, capabilities: &[Capability], resource: &str) -> bool {
        match self.grants.get(resource) {
            Some(granted) => capabilities.iter().all(|c| granted.contains(c)),
            None => capabilities.is_empty(),
        }
    }
}

/// Read a cookie value from the request headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .map(|pair| pair.trim())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then_some(value)
        })
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    bearer.or_else(|| cookie_value(headers, TOKEN_COOKIE).map(str::to_string))
}

/// Require a valid access token on every request
pub async fn require_auth(
    State(jwt): State<JwtManager>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or(ApiError::Unauthorized)?;

    let claims = jwt.validate_token(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        match e {
            JwtError::Expired | JwtError::Invalid | JwtError::Validation(_) => ApiError::InvalidToken,
            JwtError::Encoding(_) => ApiError::Internal,
        }
    })?;

    request.extensions_mut().insert(AuthUser {
        employee_id: claims.sub,
        email: claims.email,
        grants: claims.grants,
    });

    Ok(next.run(request).await)
}
