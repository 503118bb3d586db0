use std::fmt;

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

/// Raw bearer token attached to the request; not yet verified.
#[derive(Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// First stage of the two-stage check: require a well-formed `Authorization: Bearer <token>`
/// header and stash the token for the handler. Signature and expiry are checked later, by the
/// handler, through the token service.
pub async fn require_bearer(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(|reason| {
        tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), reason);
        ApiError::Unauthorized
    })?;

    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    let (scheme, token) = auth_str
        .trim()
        .split_once(' ')
        .ok_or("no token after scheme")?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use the Bearer scheme");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("no token after scheme");
    }

    Ok(token.to_string())
}
