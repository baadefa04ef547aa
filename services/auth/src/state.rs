use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::infra::cache::{
    LOGIN_ATTEMPTS, RedisChallengeStore, RedisLoginThrottle, RedisResetTokenStore,
    VERIFICATION_ATTEMPTS,
};
use crate::infra::db::DbUserRepository;
use crate::infra::mail::SmtpMailer;
use crate::usecase::login::ThrottlePolicy;
use crate::usecase::password::PasswordResetPolicy;
use crate::usecase::register::RegistrationPolicy;
use crate::usecase::tfa::{TfaGate, TfaPolicy};
use crate::usecase::verification::VerificationPolicy;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub mailer: SmtpMailer,
    pub jwt_secret: String,
    pub cookie_domain: String,
    pub tfa_policy: TfaPolicy,
    pub throttle_policy: ThrottlePolicy,
    pub registration_policy: RegistrationPolicy,
    pub password_reset_policy: PasswordResetPolicy,
    pub verification_policy: VerificationPolicy,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn challenge_store(&self) -> RedisChallengeStore {
        RedisChallengeStore {
            pool: self.redis.clone(),
        }
    }

    pub fn reset_token_store(&self) -> RedisResetTokenStore {
        RedisResetTokenStore {
            pool: self.redis.clone(),
        }
    }

    pub fn login_throttle(&self) -> RedisLoginThrottle {
        RedisLoginThrottle {
            pool: self.redis.clone(),
            prefix: LOGIN_ATTEMPTS,
        }
    }

    pub fn verification_throttle(&self) -> RedisLoginThrottle {
        RedisLoginThrottle {
            pool: self.redis.clone(),
            prefix: VERIFICATION_ATTEMPTS,
        }
    }

    pub fn tfa_gate(&self) -> TfaGate<DbUserRepository, SmtpMailer> {
        TfaGate {
            users: self.user_repo(),
            mailer: self.mailer.clone(),
            policy: self.tfa_policy,
        }
    }
}
