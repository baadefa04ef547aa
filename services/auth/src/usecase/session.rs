use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use scribe_auth_types::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};
use scribe_auth_types::token::{Claims, TokenKind, encode_token, validate_token};

use crate::domain::repository::UserRepository;
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign a token of `kind` for the user, valid for `lifetime_secs`.
pub fn sign(
    user_id: Uuid,
    role: u8,
    kind: TokenKind,
    lifetime_secs: u64,
    secret: &str,
) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs() + lifetime_secs;
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        typ: kind,
        exp,
    };
    let token = encode_token(&claims, secret).map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

/// Tokens for a freshly established session.
#[derive(Debug)]
pub struct SessionTokens {
    pub user_id: Uuid,
    pub user_role: u8,
    pub access_token: String,
    pub access_token_exp: u64,
    /// Present only for "remember me" sessions.
    pub refresh_token: Option<String>,
}

/// Establish a session: an access token always, a refresh token when the
/// user asked to be remembered.
pub fn issue_session(
    user: &AuthUser,
    remember: bool,
    secret: &str,
) -> Result<SessionTokens, AuthServiceError> {
    let (access_token, access_token_exp) =
        sign(user.id, user.role, TokenKind::Access, ACCESS_TOKEN_EXP, secret)?;
    let refresh_token = if remember {
        Some(sign(user.id, user.role, TokenKind::Refresh, REFRESH_TOKEN_EXP, secret)?.0)
    } else {
        None
    };
    Ok(SessionTokens {
        user_id: user.id,
        user_role: user.role,
        access_token,
        access_token_exp,
        refresh_token,
    })
}

// ── RefreshSession ───────────────────────────────────────────────────────────

pub struct RefreshSessionUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> RefreshSessionUseCase<U> {
    /// Exchange a refresh token for a new remembered session. The role is
    /// re-read from the user record.
    pub async fn execute(&self, refresh_token: &str) -> Result<SessionTokens, AuthServiceError> {
        let claims = validate_token(refresh_token, &self.jwt_secret, TokenKind::Refresh)
            .map_err(|_| AuthServiceError::InvalidRefreshToken)?;

        let user_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AuthServiceError::InvalidRefreshToken)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::InvalidRefreshToken)?;

        issue_session(&user, true, &self.jwt_secret)
    }
}
