//! Forgotten-password flow: an emailed single-use token, exchanged together
//! with the account email for a new password.
//!
//! Resetting never signs the user in, so the next session still goes through
//! the two-factor login gate.

use chrono::{Duration, Utc};
use rand::RngExt;

use crate::domain::password::{hash_password, verify_password};
use crate::domain::repository::{Mailer, ResetTokenStore, UserRepository};
use crate::domain::types::{ResetRecord, normalize_email};
use crate::error::AuthServiceError;
use crate::usecase::register::validate_password;

const RESET_TOKEN_LEN: usize = 64;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_reset_token() -> String {
    let mut rng = rand::rng();
    (0..RESET_TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Password reset settings.
#[derive(Debug, Clone)]
pub struct PasswordResetPolicy {
    /// Lifetime of an emailed token.
    pub token_ttl_secs: u64,
    /// Minimum gap between two reset mails for one account.
    pub throttle_secs: u64,
    /// Frontend base URL the reset link points at, without trailing slash.
    pub app_url: String,
}

impl PasswordResetPolicy {
    pub fn link(&self, token: &str) -> String {
        format!("{}/password/reset/{}", self.app_url, token)
    }

    fn is_expired(&self, record: &ResetRecord) -> bool {
        let ttl = Duration::seconds(i64::try_from(self.token_ttl_secs).unwrap_or(i64::MAX));
        Utc::now() - record.created_at >= ttl
    }
}

fn required_email(email: &str) -> Result<String, AuthServiceError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AuthServiceError::validation("the email field is required"));
    }
    Ok(email)
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

pub struct ForgotPasswordUseCase<U, M, R>
where
    U: UserRepository,
    M: Mailer,
    R: ResetTokenStore,
{
    pub users: U,
    pub mailer: M,
    pub tokens: R,
    pub policy: PasswordResetPolicy,
}

impl<U, M, R> ForgotPasswordUseCase<U, M, R>
where
    U: UserRepository,
    M: Mailer,
    R: ResetTokenStore,
{
    /// Email a reset link, replacing any earlier token.
    pub async fn execute(&self, email: &str) -> Result<(), AuthServiceError> {
        let email = required_email(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if let Some(previous) = self.tokens.get(user.id).await? {
            let elapsed = (Utc::now() - previous.created_at).num_seconds().max(0) as u64;
            if elapsed < self.policy.throttle_secs {
                return Err(AuthServiceError::TooManyAttempts {
                    retry_after_secs: self.policy.throttle_secs - elapsed,
                });
            }
        }

        let token = generate_reset_token();
        let record = ResetRecord {
            token_hash: hash_password(&token)?,
            created_at: Utc::now(),
        };
        self.tokens
            .put(user.id, &record, self.policy.token_ttl_secs)
            .await?;

        let link = self.policy.link(&token);
        let expires_in_mins = self.policy.token_ttl_secs / 60;
        if let Err(e) = self
            .mailer
            .send_password_reset(&user.email, user.locale, &link, expires_in_mins)
            .await
        {
            self.tokens.delete(user.id).await?;
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "password reset link sent");
        Ok(())
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub email: String,
    pub token: String,
    pub password: String,
    pub password_confirmation: String,
}

pub struct ResetPasswordUseCase<U, R>
where
    U: UserRepository,
    R: ResetTokenStore,
{
    pub users: U,
    pub tokens: R,
    pub policy: PasswordResetPolicy,
}

impl<U, R> ResetPasswordUseCase<U, R>
where
    U: UserRepository,
    R: ResetTokenStore,
{
    /// Set a new password. The token is consumed on success only.
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), AuthServiceError> {
        let email = required_email(&input.email)?;
        if input.token.is_empty() {
            return Err(AuthServiceError::validation("the token field is required"));
        }
        validate_password(&input.password, &input.password_confirmation)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let record = self
            .tokens
            .get(user.id)
            .await?
            .ok_or(AuthServiceError::InvalidResetToken)?;
        if self.policy.is_expired(&record) {
            self.tokens.delete(user.id).await?;
            return Err(AuthServiceError::InvalidResetToken);
        }
        if !verify_password(&input.token, &record.token_hash)? {
            return Err(AuthServiceError::InvalidResetToken);
        }

        let password_hash = hash_password(&input.password)?;
        if !self.users.set_password(user.id, &password_hash).await? {
            return Err(AuthServiceError::UserNotFound);
        }
        self.tokens.delete(user.id).await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
