use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use scribe_domain::locale::Locale;

/// Account data the auth service needs for credential checks, session claims
/// and the two-factor login gate.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: u8,
    pub locale: Locale,
    pub tfa: bool,
    pub tfa_code: Option<String>,
    pub tfa_code_created_at: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Row to insert on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: u8,
    pub locale: Locale,
    pub tfa: bool,
    /// Set at registration when address verification is not required.
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A login that passed primary credentials and now waits for its security
/// code. Stored under a random challenge id handed to the client as a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChallenge {
    pub user_id: Uuid,
    pub remember: bool,
    /// Failed-login counter to clear once the code is confirmed.
    pub throttle_key: String,
}

/// An outstanding password reset, one per user. Only the hash of the emailed
/// token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRecord {
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Lowest six-digit security code.
pub const TFA_CODE_MIN: u32 = 100_000;

/// Highest six-digit security code.
pub const TFA_CODE_MAX: u32 = 999_999;

/// Normalize an email address for lookup and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Throttle bucket for failed logins: one per normalized email and client origin.
pub fn throttle_key(email: &str, origin: &str) -> String {
    format!("{}|{}", normalize_email(email), origin)
}
