#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use scribe_domain::locale::Locale;

use crate::domain::types::{AuthUser, NewUser, PendingChallenge, ResetRecord};
use crate::error::AuthServiceError;

/// Repository for account records.
pub trait UserRepository: Send + Sync {
    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError>;

    /// Insert a new account. Fails with `EmailTaken` on a duplicate email.
    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError>;

    /// Store a freshly issued security code, replacing any previous one.
    async fn set_tfa_code(
        &self,
        user_id: Uuid,
        code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError>;

    /// Replace `used_code` with `next_code` only if `used_code` is still the
    /// stored code. Returns `false` when another request already replaced it.
    async fn consume_tfa_code(
        &self,
        user_id: Uuid,
        used_code: &str,
        next_code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;

    /// Returns `false` if the user does not exist.
    async fn set_tfa(&self, user_id: Uuid, enabled: bool) -> Result<bool, AuthServiceError>;

    /// Returns `false` if the user does not exist.
    async fn set_locale(&self, user_id: Uuid, locale: Locale) -> Result<bool, AuthServiceError>;

    /// Replace the password hash. Returns `false` if the user does not exist.
    async fn set_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AuthServiceError>;

    /// Stamp the address as verified unless it already is. Returns `true` only
    /// when this call did the stamping.
    async fn mark_email_verified(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError>;
}

/// Short-lived storage for pending two-factor challenges (Redis, TTL).
pub trait ChallengeStore: Send + Sync {
    async fn put(
        &self,
        challenge_id: &str,
        challenge: &PendingChallenge,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;

    async fn get(&self, challenge_id: &str) -> Result<Option<PendingChallenge>, AuthServiceError>;

    async fn delete(&self, challenge_id: &str) -> Result<(), AuthServiceError>;
}

/// Outstanding password resets keyed by user (Redis, TTL).
pub trait ResetTokenStore: Send + Sync {
    async fn put(
        &self,
        user_id: Uuid,
        record: &ResetRecord,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;

    async fn get(&self, user_id: Uuid) -> Result<Option<ResetRecord>, AuthServiceError>;

    async fn delete(&self, user_id: Uuid) -> Result<(), AuthServiceError>;
}

/// Fixed-window attempt counters. Used for failed logins keyed by email +
/// origin, and for verification mails keyed by user.
pub trait LoginThrottle: Send + Sync {
    async fn attempts(&self, key: &str) -> Result<u64, AuthServiceError>;

    /// Record a failure. The window starts at the first failure.
    async fn hit(&self, key: &str, decay_secs: u64) -> Result<u64, AuthServiceError>;

    /// Seconds until the counter resets.
    async fn available_in(&self, key: &str) -> Result<u64, AuthServiceError>;

    async fn clear(&self, key: &str) -> Result<(), AuthServiceError>;
}

/// Outbound mail.
pub trait Mailer: Send + Sync {
    /// Send a security code. Transport failures map to `DeliveryError`.
    async fn send_tfa_code(
        &self,
        to: &str,
        locale: Locale,
        code: &str,
    ) -> Result<(), AuthServiceError>;

    /// Send the link that carries a password reset token.
    async fn send_password_reset(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
        expires_in_mins: u64,
    ) -> Result<(), AuthServiceError>;

    /// Send the link that confirms the address belongs to the account.
    async fn send_email_verification(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
    ) -> Result<(), AuthServiceError>;
}
