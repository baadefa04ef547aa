//! Signed JWTs issued by the auth service.
//!
//! Every token carries a `typ` claim. Access, refresh and email-verification
//! tokens share a signing secret, so each validator accepts exactly one kind.

use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived credential checked by the gateway on every request.
    Access,
    /// "Remember me" credential, exchanged for a new session.
    Refresh,
    /// Link token proving control of the registered email address.
    EmailVerification,
}

/// Caller identity read from a valid access token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub user_role: u8,
    pub access_token_exp: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token of kind {found:?} where {expected:?} was required")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Claims payload.
///
/// `sub` is the user id as a UUID string, `role` the `u8` wire value of
/// `scribe_domain::user::UserRole` and `exp` seconds since the epoch.
/// Verification tokens carry role `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: u8,
    pub typ: TokenKind,
    pub exp: u64,
}

fn decode_claims(token: &str, secret: &str, expected: TokenKind) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed,
        })?
        .claims;

    if claims.typ != expected {
        return Err(AuthError::WrongKind {
            expected,
            found: claims.typ,
        });
    }
    Ok(claims)
}

/// Validate an access-token cookie value. Refresh and verification tokens
/// are refused even though they carry a valid signature.
pub fn validate_access_token(cookie_value: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let claims = decode_claims(cookie_value, secret, TokenKind::Access)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        user_role: claims.role,
        access_token_exp: claims.exp,
    })
}

/// Validate a token of the given kind and return its claims.
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
pub fn validate_token(token: &str, secret: &str, kind: TokenKind) -> Result<Claims, AuthError> {
    decode_claims(token, secret, kind)
}

/// Sign claims with HS256.
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
}
