//! Authentication middleware for the CRUD routes.
//!
//! Runs the same authorization decision as `POST /v1/authorize` on the
//! request's `Authorization` header. A denial ends the request with 401; an
//! allow stores the [`Principal`] in the request extensions.

use crate::errors::ApiError;
use crate::routes::AppState;
use authorizer::{decide, AuthError};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Authenticated caller, taken from the token's `sub` claim.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Principal").field(&"[REDACTED]").finish()
    }
}

/// Read the `Authorization` header.
///
/// An absent header is `Ok(None)`. A value that is not visible ASCII is
/// present but unusable, so it is reported as `MalformedAuthHeader`.
pub(crate) fn read_auth_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AuthError::MalformedAuthHeader),
    }
}

/// Require an allowed authorization decision.
///
/// # Response
///
/// - Returns 401 Unauthorized with `WWW-Authenticate: Bearer` on denial
/// - Continues to the handler with `Principal` in extensions otherwise
#[instrument(skip_all, name = "gallery.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let decision = match read_auth_header(req.headers()) {
        Ok(header) => {
            let header = header.map(str::to_owned);
            state.authorizer.authorize_header(header.as_deref()).await
        }
        Err(err) => decide(Err(err)),
    };

    if !decision.is_allowed() {
        tracing::debug!(target: "gallery.middleware.auth", "Request denied");
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(Principal(decision.principal_id));

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_principal_debug_is_redacted() {
        let principal = Principal("auth0|alice".to_string());

        let debug = format!("{:?}", principal);

        assert!(!debug.contains("alice"));
        assert_eq!(principal.id(), "auth0|alice");
    }

    #[test]
    fn test_read_absent_header() {
        assert_eq!(read_auth_header(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn test_read_present_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        assert_eq!(read_auth_header(&headers), Ok(Some("Bearer abc")));
    }

    #[test]
    fn test_non_utf8_header_is_malformed_not_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );

        assert_eq!(
            read_auth_header(&headers),
            Err(AuthError::MalformedAuthHeader)
        );
    }
}
