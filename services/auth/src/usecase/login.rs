use uuid::Uuid;

use crate::domain::password::verify_password;
use crate::domain::repository::{ChallengeStore, LoginThrottle, Mailer, UserRepository};
use crate::domain::types::{PendingChallenge, normalize_email, throttle_key};
use crate::error::AuthServiceError;
use crate::usecase::session::{SessionTokens, issue_session};
use crate::usecase::tfa::TfaGate;

/// Failed-login lockout settings.
#[derive(Debug, Clone, Copy)]
pub struct ThrottlePolicy {
    pub max_attempts: u64,
    pub decay_secs: u64,
}

pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub remember: bool,
    /// Client address as seen by the service (throttle bucket).
    pub origin: String,
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Gate not active: the session is established immediately.
    Authenticated(SessionTokens),
    /// Gate active: a code was emailed; the client must confirm it under
    /// this challenge id.
    ChallengeSent { challenge_id: String },
}

pub struct LoginUseCase<U, M, C, T>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
    T: LoginThrottle,
{
    pub gate: TfaGate<U, M>,
    pub challenges: C,
    pub throttle: T,
    pub throttle_policy: ThrottlePolicy,
    pub jwt_secret: String,
}

impl<U, M, C, T> LoginUseCase<U, M, C, T>
where
    U: UserRepository,
    M: Mailer,
    C: ChallengeStore,
    T: LoginThrottle,
{
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutcome, AuthServiceError> {
        if input.email.trim().is_empty() {
            return Err(AuthServiceError::validation("the email field is required"));
        }
        if input.password.is_empty() {
            return Err(AuthServiceError::validation("the password field is required"));
        }

        // 1. Lockout is checked before the credentials are looked at.
        let key = throttle_key(&input.email, &input.origin);
        if self.throttle.attempts(&key).await? >= self.throttle_policy.max_attempts {
            let retry_after_secs = self.throttle.available_in(&key).await?;
            tracing::warn!(origin = %input.origin, "login locked out");
            return Err(AuthServiceError::TooManyAttempts { retry_after_secs });
        }

        // 2. Primary credentials; unknown email and wrong password look the same.
        let user = self
            .gate
            .users
            .find_by_email(&normalize_email(&input.email))
            .await?;
        let user = match user {
            Some(user) if verify_password(&input.password, &user.password_hash)? => user,
            _ => {
                self.throttle
                    .hit(&key, self.throttle_policy.decay_secs)
                    .await?;
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        // 3. Gate inactive: session right away.
        if !self.gate.is_active(&user) {
            self.throttle.clear(&key).await?;
            let tokens = issue_session(&user, input.remember, &self.jwt_secret)?;
            return Ok(LoginOutcome::Authenticated(tokens));
        }

        // 4. Gate active: the challenge must be delivered before the client
        //    learns that a code is pending.
        self.gate.challenge(&user).await?;

        let challenge_id = Uuid::new_v4().to_string();
        let pending = PendingChallenge {
            user_id: user.id,
            remember: input.remember,
            throttle_key: key,
        };
        self.challenges
            .put(&challenge_id, &pending, self.gate.policy.challenge_ttl_secs())
            .await?;

        Ok(LoginOutcome::ChallengeSent { challenge_id })
    }
}
