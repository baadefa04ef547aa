//! Email address verification.
//!
//! The link carries a signed `email_verification` token for the account. It
//! only verifies the address while the same account is signed in.

use chrono::Utc;
use uuid::Uuid;

use scribe_auth_types::token::{TokenKind, validate_token};

use crate::domain::repository::{LoginThrottle, Mailer, UserRepository};
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;
use crate::usecase::session::sign;

/// Verification mails allowed per account within one window.
pub const MAX_VERIFICATION_MAILS: u64 = 6;

pub const VERIFICATION_WINDOW_SECS: u64 = 60;

/// Email verification settings.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    /// New accounts start unverified and are sent a link.
    pub required: bool,
    pub link_ttl_secs: u64,
    /// Frontend base URL the link points at, without trailing slash.
    pub app_url: String,
}

impl VerificationPolicy {
    pub fn link(&self, token: &str) -> String {
        format!("{}/email/verify/{}", self.app_url, token)
    }
}

/// Sign a fresh verification token for `user` and mail the link.
pub(crate) async fn send_verification_link<M: Mailer>(
    mailer: &M,
    user: &AuthUser,
    policy: &VerificationPolicy,
    jwt_secret: &str,
) -> Result<(), AuthServiceError> {
    let (token, _) = sign(
        user.id,
        user.role,
        TokenKind::EmailVerification,
        policy.link_ttl_secs,
        jwt_secret,
    )?;
    mailer
        .send_email_verification(&user.email, user.locale, &policy.link(&token))
        .await
}

// ── SendVerification ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub enum VerificationNotice {
    Sent,
    AlreadyVerified,
}

pub struct SendVerificationUseCase<U, M, T>
where
    U: UserRepository,
    M: Mailer,
    T: LoginThrottle,
{
    pub users: U,
    pub mailer: M,
    pub throttle: T,
    pub policy: VerificationPolicy,
    pub jwt_secret: String,
}

impl<U, M, T> SendVerificationUseCase<U, M, T>
where
    U: UserRepository,
    M: Mailer,
    T: LoginThrottle,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<VerificationNotice, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        if user.email_verified_at.is_some() {
            return Ok(VerificationNotice::AlreadyVerified);
        }

        let key = user.id.to_string();
        if self.throttle.attempts(&key).await? >= MAX_VERIFICATION_MAILS {
            let retry_after_secs = self.throttle.available_in(&key).await?;
            return Err(AuthServiceError::TooManyAttempts { retry_after_secs });
        }
        self.throttle.hit(&key, VERIFICATION_WINDOW_SECS).await?;

        send_verification_link(&self.mailer, &user, &self.policy, &self.jwt_secret).await?;
        tracing::info!(user_id = %user.id, "verification link sent");
        Ok(VerificationNotice::Sent)
    }
}

// ── VerifyEmail ──────────────────────────────────────────────────────────────

pub struct VerifyEmailUseCase<U: UserRepository> {
    pub users: U,
    pub jwt_secret: String,
}

impl<U: UserRepository> VerifyEmailUseCase<U> {
    /// Mark the signed-in account's address as verified. Returns `false` when
    /// it already was.
    pub async fn execute(&self, user_id: Uuid, token: &str) -> Result<bool, AuthServiceError> {
        let claims = validate_token(token, &self.jwt_secret, TokenKind::EmailVerification)
            .map_err(|_| AuthServiceError::InvalidVerificationToken)?;
        if claims.sub != user_id.to_string() {
            return Err(AuthServiceError::InvalidVerificationToken);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        if user.email_verified_at.is_some() {
            return Ok(false);
        }

        let verified = self.users.mark_email_verified(user.id, Utc::now()).await?;
        if verified {
            tracing::info!(user_id = %user.id, "email verified");
        }
        Ok(verified)
    }
}
