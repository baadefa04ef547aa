#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use scribe_auth::domain::password::hash_password;
use scribe_auth::domain::repository::{
    ChallengeStore, LoginThrottle, Mailer, ResetTokenStore, UserRepository,
};
use scribe_auth::domain::types::{AuthUser, NewUser, PendingChallenge, ResetRecord};
use scribe_auth::error::AuthServiceError;
use scribe_auth::usecase::login::{LoginUseCase, ThrottlePolicy};
use scribe_auth::usecase::password::PasswordResetPolicy;
use scribe_auth::usecase::tfa::{TfaGate, TfaPolicy};
use scribe_auth::usecase::verification::VerificationPolicy;
use scribe_domain::locale::Locale;

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<AuthUser>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<AuthUser>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Current state of a stored user.
    pub fn get(&self, id: Uuid) -> AuthUser {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .expect("user present")
    }

    /// Backdate the stored code, as if it had been issued `age` ago.
    pub fn age_code(&self, id: Uuid, age: Duration) {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).expect("user present");
        user.tfa_code_created_at = user.tfa_code_created_at.map(|t| t - age);
    }

    pub fn set_code(&self, id: Uuid, code: &str, created_at: DateTime<Utc>) {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).expect("user present");
        user.tfa_code = Some(code.to_owned());
        user.tfa_code_created_at = Some(created_at);
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthServiceError::EmailTaken);
        }
        users.push(AuthUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            locale: user.locale,
            tfa: user.tfa,
            tfa_code: None,
            tfa_code_created_at: None,
            email_verified_at: user.email_verified_at,
        });
        Ok(())
    }

    async fn set_tfa_code(
        &self,
        user_id: Uuid,
        code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        self.set_code(user_id, code, created_at);
        Ok(())
    }

    async fn consume_tfa_code(
        &self,
        user_id: Uuid,
        used_code: &str,
        next_code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.id == user_id && u.tfa_code.as_deref() == Some(used_code))
        {
            Some(user) => {
                user.tfa_code = Some(next_code.to_owned());
                user.tfa_code_created_at = Some(created_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_tfa(&self, user_id: Uuid, enabled: bool) -> Result<bool, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.id == user_id)
            .map(|u| u.tfa = enabled)
            .is_some())
    }

    async fn set_locale(&self, user_id: Uuid, locale: Locale) -> Result<bool, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.id == user_id)
            .map(|u| u.locale = locale)
            .is_some())
    }

    async fn set_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.id == user_id)
            .map(|u| u.password_hash = password_hash.to_owned())
            .is_some())
    }

    async fn mark_email_verified(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.id == user_id && u.email_verified_at.is_none())
        {
            Some(user) => {
                user.email_verified_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub locale: Locale,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    PasswordReset,
    EmailVerification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentLink {
    pub kind: LinkKind,
    pub to: String,
    pub locale: Locale,
    pub link: String,
}

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub links: Arc<Mutex<Vec<SentLink>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|m| m.code.clone())
            .expect("a code was sent")
    }

    pub fn links(&self, kind: LinkKind) -> Vec<SentLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.kind == kind)
            .cloned()
            .collect()
    }

    /// Last path segment of the newest link of `kind`.
    pub fn last_link_token(&self, kind: LinkKind) -> String {
        self.links(kind)
            .last()
            .and_then(|l| l.link.rsplit('/').next().map(str::to_owned))
            .expect("a link was sent")
    }

    fn check_failing(&self) -> Result<(), AuthServiceError> {
        if *self.fail.lock().unwrap() {
            return Err(AuthServiceError::DeliveryError(
                "connection refused".to_owned(),
            ));
        }
        Ok(())
    }

    fn push_link(&self, kind: LinkKind, to: &str, locale: Locale, link: &str) {
        self.links.lock().unwrap().push(SentLink {
            kind,
            to: to.to_owned(),
            locale,
            link: link.to_owned(),
        });
    }
}

impl Mailer for MockMailer {
    async fn send_tfa_code(
        &self,
        to: &str,
        locale: Locale,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        self.check_failing()?;
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_owned(),
            locale,
            code: code.to_owned(),
        });
        Ok(())
    }

    async fn send_password_reset(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
        _expires_in_mins: u64,
    ) -> Result<(), AuthServiceError> {
        self.check_failing()?;
        self.push_link(LinkKind::PasswordReset, to, locale, link);
        Ok(())
    }

    async fn send_email_verification(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
    ) -> Result<(), AuthServiceError> {
        self.check_failing()?;
        self.push_link(LinkKind::EmailVerification, to, locale, link);
        Ok(())
    }
}

// ── MockChallengeStore ───────────────────────────────────────────────────────

#[derive(Clone)]
struct StoredChallenge {
    challenge: PendingChallenge,
    ttl_secs: u64,
    expires_at: u64,
}

/// Expires entries like Redis `SET EX`, against a clock moved by `elapse`.
#[derive(Clone, Default)]
pub struct MockChallengeStore {
    entries: Arc<Mutex<HashMap<String, StoredChallenge>>>,
    clock: Arc<Mutex<u64>>,
}

impl MockChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the store clock, evicting entries whose TTL ran out.
    pub fn elapse(&self, secs: u64) {
        let mut clock = self.clock.lock().unwrap();
        *clock += secs;
        let now = *clock;
        self.entries.lock().unwrap().retain(|_, e| e.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Live entry with the TTL it was stored with.
    pub fn get_entry(&self, id: &str) -> Option<(PendingChallenge, u64)> {
        self.entries
            .lock()
            .unwrap()
            .get(id)
            .map(|e| (e.challenge.clone(), e.ttl_secs))
    }
}

impl ChallengeStore for MockChallengeStore {
    async fn put(
        &self,
        challenge_id: &str,
        challenge: &PendingChallenge,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let now = *self.clock.lock().unwrap();
        self.entries.lock().unwrap().insert(
            challenge_id.to_owned(),
            StoredChallenge {
                challenge: challenge.clone(),
                ttl_secs,
                expires_at: now + ttl_secs,
            },
        );
        Ok(())
    }

    async fn get(&self, challenge_id: &str) -> Result<Option<PendingChallenge>, AuthServiceError> {
        Ok(self.get_entry(challenge_id).map(|(c, _)| c))
    }

    async fn delete(&self, challenge_id: &str) -> Result<(), AuthServiceError> {
        self.entries.lock().unwrap().remove(challenge_id);
        Ok(())
    }
}

// ── MockResetTokenStore ──────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockResetTokenStore {
    /// user id → (record, ttl seconds)
    pub records: Arc<Mutex<HashMap<Uuid, (ResetRecord, u64)>>>,
}

impl MockResetTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_record(&self, user_id: Uuid) -> Option<(ResetRecord, u64)> {
        self.records.lock().unwrap().get(&user_id).cloned()
    }

    /// Backdate the stored record, as if it had been issued `age` ago.
    pub fn age(&self, user_id: Uuid, age: Duration) {
        if let Some((record, _)) = self.records.lock().unwrap().get_mut(&user_id) {
            record.created_at -= age;
        }
    }
}

impl ResetTokenStore for MockResetTokenStore {
    async fn put(
        &self,
        user_id: Uuid,
        record: &ResetRecord,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        self.records
            .lock()
            .unwrap()
            .insert(user_id, (record.clone(), ttl_secs));
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<ResetRecord>, AuthServiceError> {
        Ok(self.get_record(user_id).map(|(r, _)| r))
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        self.records.lock().unwrap().remove(&user_id);
        Ok(())
    }
}

// ── MockLoginThrottle ────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockLoginThrottle {
    pub counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl MockLoginThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl LoginThrottle for MockLoginThrottle {
    async fn attempts(&self, key: &str) -> Result<u64, AuthServiceError> {
        Ok(self.count(key))
    }

    async fn hit(&self, key: &str, _decay_secs: u64) -> Result<u64, AuthServiceError> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.to_owned()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn available_in(&self, _key: &str) -> Result<u64, AuthServiceError> {
        Ok(THROTTLE_DECAY_SECS)
    }

    async fn clear(&self, key: &str) -> Result<(), AuthServiceError> {
        self.counts.lock().unwrap().remove(key);
        Ok(())
    }
}

// ── Test fixture helpers ─────────────────────────────────────────────────────

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";
pub const TEST_PASSWORD: &str = "correct horse battery";
pub const TEST_ORIGIN: &str = "203.0.113.7";
pub const THROTTLE_DECAY_SECS: u64 = 60;
pub const MAX_ATTEMPTS: u64 = 5;

pub fn test_user(tfa: bool) -> AuthUser {
    AuthUser {
        id: Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap(),
        name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role: 0,
        locale: Locale::De,
        tfa,
        tfa_code: None,
        tfa_code_created_at: None,
        email_verified_at: Some(Utc::now()),
    }
}

pub fn unverified_user() -> AuthUser {
    AuthUser {
        email_verified_at: None,
        ..test_user(false)
    }
}

pub const TEST_APP_URL: &str = "https://app.example.com";

pub fn reset_policy() -> PasswordResetPolicy {
    PasswordResetPolicy {
        token_ttl_secs: 60 * 60,
        throttle_secs: 60,
        app_url: TEST_APP_URL.to_owned(),
    }
}

pub fn verification_policy(required: bool) -> VerificationPolicy {
    VerificationPolicy {
        required,
        link_ttl_secs: 60 * 60,
        app_url: TEST_APP_URL.to_owned(),
    }
}

pub fn tfa_policy(enabled: bool) -> TfaPolicy {
    TfaPolicy {
        enabled,
        code_ttl: Duration::minutes(30),
        challenge_ttl: Duration::hours(24),
    }
}

pub fn gate(
    users: &MockUserRepo,
    mailer: &MockMailer,
    enabled: bool,
) -> TfaGate<MockUserRepo, MockMailer> {
    TfaGate {
        users: users.clone(),
        mailer: mailer.clone(),
        policy: tfa_policy(enabled),
    }
}

/// Shared-state mocks for one scenario. Clones observe the same data.
#[derive(Clone, Default)]
pub struct Harness {
    pub users: MockUserRepo,
    pub mailer: MockMailer,
    pub challenges: MockChallengeStore,
    pub throttle: MockLoginThrottle,
    pub gate_enabled: bool,
}

impl Harness {
    pub fn new(users: Vec<AuthUser>) -> Self {
        Self {
            users: MockUserRepo::new(users),
            gate_enabled: true,
            ..Self::default()
        }
    }

    pub fn with_gate(mut self, enabled: bool) -> Self {
        self.gate_enabled = enabled;
        self
    }

    pub fn gate(&self) -> TfaGate<MockUserRepo, MockMailer> {
        gate(&self.users, &self.mailer, self.gate_enabled)
    }

    pub fn login(
        &self,
    ) -> LoginUseCase<MockUserRepo, MockMailer, MockChallengeStore, MockLoginThrottle> {
        LoginUseCase {
            gate: self.gate(),
            challenges: self.challenges.clone(),
            throttle: self.throttle.clone(),
            throttle_policy: ThrottlePolicy {
                max_attempts: MAX_ATTEMPTS,
                decay_secs: THROTTLE_DECAY_SECS,
            },
            jwt_secret: TEST_JWT_SECRET.to_owned(),
        }
    }
}
