//! Session token extractor.
//!
//! Reads the token from `Authorization: Bearer <token>`, falling back to the
//! `x-auth-token` header older clients send.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, Session};
use crate::state::AppState;

/// Legacy token header.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Extractor that requires a valid session token.
///
/// Rejects with 401 when the token is missing, malformed or expired. Role
/// checks are left to [`crate::policy::authorize`].
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Authenticated(session): Authenticated) -> Result<Json<Order>> {
///     policy::authorize(Operation::ListOrders, &session)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Session);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        let session = state.tokens().verify(token)?;

        tracing::Span::current().record("identity_id", session.identity_id.as_i32());
        set_sentry_user(&session.identity_id, session.role.as_str());

        Ok(Self(session))
    }
}

/// Token from the `Authorization` bearer scheme or the legacy header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let from_authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim);

    from_authorization
        .or_else(|| {
            headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_legacy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_or_empty() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static(""));
        assert_eq!(bearer_token(&headers), None);
    }
}
