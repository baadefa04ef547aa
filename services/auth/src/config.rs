use anyhow::{Context as _, bail};
use chrono::Duration;
use serde::Deserialize;

use scribe_core::config::Config;

use crate::usecase::password::PasswordResetPolicy;
use crate::usecase::tfa::TfaPolicy;
use crate::usecase::verification::VerificationPolicy;

/// Auth service configuration loaded from environment variables.
///
/// Each field maps to the upper-cased env var of the same name
/// (`database_url` → `DATABASE_URL`).
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (pending challenges, login throttling).
    pub redis_url: String,
    /// HMAC secret for signing JWT access and refresh tokens.
    pub jwt_secret: String,
    /// Cookie domain attribute (root domain, e.g. "example.com").
    pub cookie_domain: String,
    /// TCP port to listen on.
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,
    /// Public frontend URL used in emailed links.
    pub app_url: String,

    /// Process-wide switch for the two-factor login gate.
    #[serde(default = "default_true")]
    pub login_tfa: bool,
    /// How long an emailed security code stays valid.
    #[serde(default = "default_tfa_code_ttl_secs")]
    pub tfa_code_ttl_secs: u64,
    /// How long a pending challenge (and its cookie) survives. Longer than the
    /// code lifetime so an expired code can still be replaced via resend.
    #[serde(default = "default_tfa_challenge_ttl_secs")]
    pub tfa_challenge_ttl_secs: u64,
    /// Failed logins per email + origin before lockout.
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u64,
    /// Lockout window, counted from the first failed attempt.
    #[serde(default = "default_login_lockout_secs")]
    pub login_lockout_secs: u64,

    #[serde(default = "default_true")]
    pub registration_enabled: bool,
    /// Initial `tfa` flag for newly registered accounts.
    #[serde(default)]
    pub registration_tfa: bool,
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// New accounts must confirm their email address through a mailed link.
    #[serde(default)]
    pub registration_verification: bool,
    #[serde(default = "default_link_ttl_secs")]
    pub email_verification_ttl_secs: u64,

    #[serde(default = "default_link_ttl_secs")]
    pub password_reset_ttl_secs: u64,
    /// Minimum gap between two reset mails for one account.
    #[serde(default = "default_password_reset_throttle_secs")]
    pub password_reset_throttle_secs: u64,

    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender mailbox, e.g. `"Scribe <no-reply@example.com>"`.
    pub mail_from: String,
}

impl Config for AuthConfig {}

fn secs(name: &str, value: u64) -> anyhow::Result<Duration> {
    let secs = i64::try_from(value).with_context(|| format!("{name} out of range"))?;
    Ok(Duration::seconds(secs))
}

impl AuthConfig {
    /// Gate settings. The pending challenge must outlive the code it carries.
    pub fn tfa_policy(&self) -> anyhow::Result<TfaPolicy> {
        if self.tfa_challenge_ttl_secs <= self.tfa_code_ttl_secs {
            bail!(
                "TFA_CHALLENGE_TTL_SECS ({}) must exceed TFA_CODE_TTL_SECS ({})",
                self.tfa_challenge_ttl_secs,
                self.tfa_code_ttl_secs
            );
        }
        Ok(TfaPolicy {
            enabled: self.login_tfa,
            code_ttl: secs("TFA_CODE_TTL_SECS", self.tfa_code_ttl_secs)?,
            challenge_ttl: secs("TFA_CHALLENGE_TTL_SECS", self.tfa_challenge_ttl_secs)?,
        })
    }

    fn app_base_url(&self) -> String {
        self.app_url.trim_end_matches('/').to_owned()
    }

    pub fn password_reset_policy(&self) -> PasswordResetPolicy {
        PasswordResetPolicy {
            token_ttl_secs: self.password_reset_ttl_secs,
            throttle_secs: self.password_reset_throttle_secs,
            app_url: self.app_base_url(),
        }
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            required: self.registration_verification,
            link_ttl_secs: self.email_verification_ttl_secs,
            app_url: self.app_base_url(),
        }
    }
}

fn default_auth_port() -> u16 {
    3112
}

fn default_true() -> bool {
    true
}

fn default_tfa_code_ttl_secs() -> u64 {
    30 * 60
}

fn default_tfa_challenge_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_login_max_attempts() -> u64 {
    5
}

fn default_login_lockout_secs() -> u64 {
    60
}

fn default_link_ttl_secs() -> u64 {
    60 * 60
}

fn default_password_reset_throttle_secs() -> u64 {
    60
}

fn default_locale() -> String {
    "en".to_owned()
}

fn default_smtp_port() -> u16 {
    587
}
