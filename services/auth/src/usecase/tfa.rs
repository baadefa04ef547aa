//! Two-factor login gate.
//!
//! A login whose primary credentials check out is held back when the gate is
//! active for the account: a six-digit code is stored on the user row, emailed,
//! and must be confirmed within the code lifetime before a session is issued.
//!
//! ```text
//! UNCHALLENGED --challenge--> CHALLENGE_SENT --validate--> AUTHENTICATED
//!                                  |   ^
//!                                  +---+ resend
//! ```
//!
//! An abandoned challenge is never cleaned up explicitly: the code expires
//! first, and the longer-lived pending record's TTL runs out later.

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;

use crate::domain::repository::{ChallengeStore, LoginThrottle, Mailer, UserRepository};
use crate::domain::types::{AuthUser, PendingChallenge, TFA_CODE_MAX, TFA_CODE_MIN};
use crate::error::AuthServiceError;
use crate::usecase::session::{SessionTokens, issue_session};

/// Six uniformly random digits in `100000..=999999`.
pub fn generate_tfa_code() -> String {
    let mut rng = rand::rng();
    rng.random_range(TFA_CODE_MIN..=TFA_CODE_MAX).to_string()
}

/// Process-wide gate settings, evaluated on every call.
///
/// `challenge_ttl` bounds the pending challenge record and its cookie. It must
/// exceed `code_ttl`, so a stale code is still reported as expired and can be
/// replaced through resend.
#[derive(Debug, Clone, Copy)]
pub struct TfaPolicy {
    pub enabled: bool,
    pub code_ttl: Duration,
    pub challenge_ttl: Duration,
}

impl TfaPolicy {
    pub fn code_ttl_secs(&self) -> u64 {
        u64::try_from(self.code_ttl.num_seconds()).unwrap_or(0)
    }

    pub fn challenge_ttl_secs(&self) -> u64 {
        u64::try_from(self.challenge_ttl.num_seconds()).unwrap_or(0)
    }
}

/// Compare a submitted code against the user's stored one.
///
/// Mismatch wins over expiry: a wrong code is `InvalidCode` however old the
/// stored code is.
pub fn check_code(
    user: &AuthUser,
    submitted: u32,
    now: DateTime<Utc>,
    code_ttl: Duration,
) -> Result<(), AuthServiceError> {
    let stored = user
        .tfa_code
        .as_deref()
        .and_then(|c| c.parse::<u32>().ok())
        .ok_or(AuthServiceError::InvalidCode)?;
    if stored != submitted {
        return Err(AuthServiceError::InvalidCode);
    }
    let issued_at = user
        .tfa_code_created_at
        .ok_or(AuthServiceError::ExpiredCode)?;
    if now - issued_at >= code_ttl {
        return Err(AuthServiceError::ExpiredCode);
    }
    Ok(())
}

pub struct TfaGate<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    pub users: U,
    pub mailer: M,
    pub policy: TfaPolicy,
}

impl<U, M> TfaGate<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    /// Both the process-wide switch and the account flag must be on.
    pub fn is_active(&self, user: &AuthUser) -> bool {
        self.policy.enabled && user.tfa
    }

    /// Issue a fresh code and email it in the user's locale.
    ///
    /// The code is persisted before sending, so a delivery failure still
    /// leaves the new code stored.
    pub async fn challenge(&self, user: &AuthUser) -> Result<(), AuthServiceError> {
        let code = generate_tfa_code();
        self.users
            .set_tfa_code(user.id, &code, Utc::now())
            .await?;
        self.mailer
            .send_tfa_code(&user.email, user.locale, &code)
            .await?;
        tracing::info!(user_id = %user.id, "security code sent");
        Ok(())
    }

    /// Check the submitted code and consume it.
    ///
    /// Consumption replaces the stored code with a new, unsent one. The
    /// replacement is conditional on the stored code still being the one
    /// checked, so concurrent submissions of the same code yield one success.
    pub async fn validate(&self, user: &AuthUser, submitted: u32) -> Result<(), AuthServiceError> {
        let now = Utc::now();
        check_code(user, submitted, now, self.policy.code_ttl)?;

        let used = user.tfa_code.as_deref().unwrap_or_default();
        let consumed = self
            .users
            .consume_tfa_code(user.id, used, &generate_tfa_code(), now)
            .await?;
        if !consumed {
            return Err(AuthServiceError::InvalidCode);
        }
        Ok(())
    }

    /// Send a new code for a challenge already in progress.
    pub async fn resend(&self, user: &AuthUser) -> Result<(), AuthServiceError> {
        self.challenge(user).await
    }
}

/// Load the user behind a pending challenge, provided the gate still applies.
async fn resolve_pending<U, M, C>(
    gate: &TfaGate<U, M>,
    challenges: &C,
    challenge_id: &str,
) -> Result<(PendingChallenge, AuthUser), AuthServiceError>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
{
    let pending = challenges
        .get(challenge_id)
        .await?
        .ok_or(AuthServiceError::ChallengeNotFound)?;
    let user = gate.users.find_by_id(pending.user_id).await?;
    match user {
        Some(user) if gate.is_active(&user) => Ok((pending, user)),
        _ => {
            challenges.delete(challenge_id).await?;
            Err(AuthServiceError::ChallengeNotFound)
        }
    }
}

// ── ConfirmTfa ───────────────────────────────────────────────────────────────

pub struct ConfirmTfaInput {
    pub challenge_id: String,
    pub code: u32,
}

pub struct ConfirmTfaUseCase<U, M, C, T>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
    T: LoginThrottle,
{
    pub gate: TfaGate<U, M>,
    pub challenges: C,
    pub throttle: T,
    pub jwt_secret: String,
}

impl<U, M, C, T> ConfirmTfaUseCase<U, M, C, T>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
    T: LoginThrottle,
{
    /// A wrong or expired code leaves the pending challenge in place so the
    /// user can retry or ask for a new code.
    pub async fn execute(&self, input: ConfirmTfaInput) -> Result<SessionTokens, AuthServiceError> {
        let (pending, user) =
            resolve_pending(&self.gate, &self.challenges, &input.challenge_id).await?;

        self.gate.validate(&user, input.code).await?;

        self.challenges.delete(&input.challenge_id).await?;
        self.throttle.clear(&pending.throttle_key).await?;
        tracing::info!(user_id = %user.id, "two-factor login completed");

        issue_session(&user, pending.remember, &self.jwt_secret)
    }
}

// ── ResendTfa ────────────────────────────────────────────────────────────────

pub struct ResendTfaUseCase<U, M, C>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
{
    pub gate: TfaGate<U, M>,
    pub challenges: C,
}

impl<U, M, C> ResendTfaUseCase<U, M, C>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
{
    /// On success the pending challenge gets a full new lifetime. On delivery
    /// failure the challenge is dropped and the user restarts at login.
    pub async fn execute(&self, challenge_id: &str) -> Result<(), AuthServiceError> {
        let (pending, user) = resolve_pending(&self.gate, &self.challenges, challenge_id).await?;

        if let Err(e) = self.gate.resend(&user).await {
            if matches!(e, AuthServiceError::DeliveryError(_)) {
                self.challenges.delete(challenge_id).await?;
            }
            return Err(e);
        }

        self.challenges
            .put(challenge_id, &pending, self.gate.policy.challenge_ttl_secs())
            .await
    }
}
