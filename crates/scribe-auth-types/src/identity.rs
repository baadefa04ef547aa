//! Gateway-injected identity headers extractor.
//!
//! The gateway validates the access-token cookie and forwards the caller's
//! identity to upstream routes as plain headers. Routes that act on "the
//! current account" extract [`IdentityHeaders`] instead of touching cookies.

use std::str::FromStr;

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderMap, StatusCode};
use uuid::Uuid;

pub const X_SCRIBE_USER_ID: &str = "x-scribe-user-id";
pub const X_SCRIBE_USER_ROLE: &str = "x-scribe-user-role";

/// Authenticated caller as forwarded by the gateway.
///
/// Extraction fails with 401 when either header is absent or unparsable.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub user_role: u8,
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<T>().ok())
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Header values are read synchronously so the returned future borrows nothing
    // from `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parse_header::<Uuid>(&parts.headers, X_SCRIBE_USER_ID)
            .zip(parse_header::<u8>(&parts.headers, X_SCRIBE_USER_ROLE))
            .map(|(user_id, user_role)| Self { user_id, user_role });

        async move { identity.ok_or(StatusCode::UNAUTHORIZED) }
    }
}
