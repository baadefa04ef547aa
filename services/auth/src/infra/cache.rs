use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Connection, Pool};
use uuid::Uuid;

use crate::domain::repository::{ChallengeStore, LoginThrottle, ResetTokenStore};
use crate::domain::types::{PendingChallenge, ResetRecord};
use crate::error::AuthServiceError;

async fn connection(pool: &Pool) -> Result<Connection, AuthServiceError> {
    pool.get()
        .await
        .map_err(|e| AuthServiceError::Internal(e.into()))
}

fn redis_err(e: deadpool_redis::redis::RedisError) -> AuthServiceError {
    AuthServiceError::Internal(e.into())
}

// ── Pending two-factor challenges ────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisChallengeStore {
    pub pool: Pool,
}

fn challenge_key(challenge_id: &str) -> String {
    format!("tfa_challenge:{}", challenge_id)
}

impl ChallengeStore for RedisChallengeStore {
    async fn put(
        &self,
        challenge_id: &str,
        challenge: &PendingChallenge,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let payload =
            serde_json::to_vec(challenge).map_err(|e| AuthServiceError::Internal(e.into()))?;
        let mut conn = connection(&self.pool).await?;
        let (): () = conn
            .set_ex(challenge_key(challenge_id), payload, ttl_secs)
            .await
            .map_err(redis_err)?;
        Ok(())
    }

    async fn get(&self, challenge_id: &str) -> Result<Option<PendingChallenge>, AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let value: Option<Vec<u8>> = conn
            .get(challenge_key(challenge_id))
            .await
            .map_err(redis_err)?;
        // An unreadable record is treated as absent; the client restarts at login.
        Ok(value.and_then(|bytes| serde_json::from_slice(&bytes).ok()))
    }

    async fn delete(&self, challenge_id: &str) -> Result<(), AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let (): () = conn
            .del(challenge_key(challenge_id))
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}

// ── Password resets ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisResetTokenStore {
    pub pool: Pool,
}

fn reset_key(user_id: Uuid) -> String {
    format!("password_reset:{}", user_id)
}

impl ResetTokenStore for RedisResetTokenStore {
    async fn put(
        &self,
        user_id: Uuid,
        record: &ResetRecord,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let payload =
            serde_json::to_vec(record).map_err(|e| AuthServiceError::Internal(e.into()))?;
        let mut conn = connection(&self.pool).await?;
        let (): () = conn
            .set_ex(reset_key(user_id), payload, ttl_secs)
            .await
            .map_err(redis_err)?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<ResetRecord>, AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let value: Option<Vec<u8>> = conn.get(reset_key(user_id)).await.map_err(redis_err)?;
        Ok(value.and_then(|bytes| serde_json::from_slice(&bytes).ok()))
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let (): () = conn.del(reset_key(user_id)).await.map_err(redis_err)?;
        Ok(())
    }
}

// ── Attempt throttles ────────────────────────────────────────────────────────

/// Key prefix for failed logins.
pub const LOGIN_ATTEMPTS: &str = "login_attempts";

/// Key prefix for verification mails.
pub const VERIFICATION_ATTEMPTS: &str = "verification_attempts";

#[derive(Clone)]
pub struct RedisLoginThrottle {
    pub pool: Pool,
    pub prefix: &'static str,
}

impl RedisLoginThrottle {
    fn attempts_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

impl LoginThrottle for RedisLoginThrottle {
    async fn attempts(&self, key: &str) -> Result<u64, AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let count: Option<u64> = conn.get(self.attempts_key(key)).await.map_err(redis_err)?;
        Ok(count.unwrap_or(0))
    }

    async fn hit(&self, key: &str, decay_secs: u64) -> Result<u64, AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let key = self.attempts_key(key);
        let count: u64 = conn.incr(&key, 1u64).await.map_err(redis_err)?;
        if count == 1 {
            let (): () = conn
                .expire(&key, decay_secs as i64)
                .await
                .map_err(redis_err)?;
        }
        Ok(count)
    }

    async fn available_in(&self, key: &str) -> Result<u64, AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        // -2: no key, -1: no expiry.
        let ttl: i64 = conn.ttl(self.attempts_key(key)).await.map_err(redis_err)?;
        Ok(ttl.max(0) as u64)
    }

    async fn clear(&self, key: &str) -> Result<(), AuthServiceError> {
        let mut conn = connection(&self.pool).await?;
        let (): () = conn.del(self.attempts_key(key)).await.map_err(redis_err)?;
        Ok(())
    }
}
