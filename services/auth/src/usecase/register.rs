use chrono::Utc;
use uuid::Uuid;

use scribe_domain::locale::Locale;
use scribe_domain::user::UserRole;

use crate::domain::password::hash_password;
use crate::domain::repository::{Mailer, UserRepository};
use crate::domain::types::{AuthUser, NewUser, normalize_email};
use crate::error::AuthServiceError;
use crate::usecase::session::{SessionTokens, issue_session};
use crate::usecase::verification::{VerificationPolicy, send_verification_link};

const MAX_NAME_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;

/// Registration settings.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationPolicy {
    pub enabled: bool,
    /// Initial `tfa` flag for new accounts.
    pub tfa: bool,
    pub default_locale: Locale,
}

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub agreement: bool,
    pub locale: Option<String>,
}

/// Password rules shared by registration and password reset.
pub(crate) fn validate_password(password: &str, confirmation: &str) -> Result<(), AuthServiceError> {
    let password_len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password_len) {
        return Err(AuthServiceError::validation(
            "the password must be between 6 and 128 characters",
        ));
    }
    if password != confirmation {
        return Err(AuthServiceError::validation(
            "the password confirmation does not match",
        ));
    }
    Ok(())
}

fn validate(input: &RegisterInput) -> Result<(), AuthServiceError> {
    let name_len = input.name.trim().chars().count();
    if name_len == 0 {
        return Err(AuthServiceError::validation("the name field is required"));
    }
    if name_len > MAX_NAME_LEN {
        return Err(AuthServiceError::validation(
            "the name may not be greater than 255 characters",
        ));
    }

    let email = input.email.trim();
    if email.is_empty() {
        return Err(AuthServiceError::validation("the email field is required"));
    }
    let valid_shape = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_shape || email.chars().count() > MAX_EMAIL_LEN {
        return Err(AuthServiceError::validation(
            "the email must be a valid email address",
        ));
    }

    validate_password(&input.password, &input.password_confirmation)?;

    if !input.agreement {
        return Err(AuthServiceError::validation("the agreement must be accepted"));
    }
    Ok(())
}

pub struct RegisterUseCase<U: UserRepository, M: Mailer> {
    pub users: U,
    pub mailer: M,
    pub policy: RegistrationPolicy,
    pub verification: VerificationPolicy,
    pub jwt_secret: String,
}

impl<U: UserRepository, M: Mailer> RegisterUseCase<U, M> {
    /// Create the account and sign it in. Registration never runs the
    /// two-factor gate.
    pub async fn execute(&self, input: RegisterInput) -> Result<SessionTokens, AuthServiceError> {
        if !self.policy.enabled {
            return Err(AuthServiceError::RegistrationClosed);
        }
        validate(&input)?;

        let locale = match input.locale.as_deref() {
            Some(tag) => tag
                .parse::<Locale>()
                .map_err(|e| AuthServiceError::validation(e.to_string()))?,
            None => self.policy.default_locale,
        };

        let email = normalize_email(&input.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken);
        }

        let now = Utc::now();
        let new_user = NewUser {
            id: Uuid::new_v4(),
            name: input.name.trim().to_owned(),
            email,
            password_hash: hash_password(&input.password)?,
            role: UserRole::User.as_u8(),
            locale,
            tfa: self.policy.tfa,
            email_verified_at: (!self.verification.required).then_some(now),
            created_at: now,
        };
        self.users.create(&new_user).await?;
        tracing::info!(user_id = %new_user.id, "user registered");

        let user = AuthUser {
            id: new_user.id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            locale: new_user.locale,
            tfa: new_user.tfa,
            tfa_code: None,
            tfa_code_created_at: None,
            email_verified_at: new_user.email_verified_at,
        };

        if self.verification.required {
            // The account stays usable; another link can be requested.
            if let Err(e) =
                send_verification_link(&self.mailer, &user, &self.verification, &self.jwt_secret)
                    .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "verification link not sent");
            }
        }

        issue_session(&user, false, &self.jwt_secret)
    }
}
