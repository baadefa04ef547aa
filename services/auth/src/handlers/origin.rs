use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

/// Client address used to bucket failed logins.
///
/// The service runs behind the gateway, so the address comes from the first
/// `x-forwarded-for` hop, then `x-real-ip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

const UNKNOWN_ORIGIN: &str = "unknown";

fn origin_from_headers(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or(real_ip)
        .unwrap_or(UNKNOWN_ORIGIN)
        .to_owned()
}

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let origin = origin_from_headers(&parts.headers);
        async move { Ok(Self(origin)) }
    }
}
