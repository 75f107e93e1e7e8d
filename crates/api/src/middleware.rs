use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use clubledger_auth::PrincipalDirectory;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Header carrying the caller's verified email, set by the upstream
/// identity provider.
pub const PRINCIPAL_HEADER: &str = "x-principal-email";

#[derive(Clone)]
pub struct AuthState {
    pub directory: Arc<dyn PrincipalDirectory>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let email = extract_principal_email(req.headers()).ok_or_else(|| {
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "missing identity header")
    })?;

    let principal = state.directory.resolve(email).map_err(|e| {
        tracing::warn!(email, error = %e, "rejected unknown principal");
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
    })?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

fn extract_principal_email(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(PRINCIPAL_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_must_be_present_and_non_blank() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_principal_email(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_principal_email(&headers), None);

        headers.insert(PRINCIPAL_HEADER, HeaderValue::from_static(" ada@club.org "));
        assert_eq!(extract_principal_email(&headers), Some("ada@club.org"));
    }
}
