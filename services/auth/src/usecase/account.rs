use uuid::Uuid;

use scribe_domain::locale::Locale;

use crate::domain::repository::UserRepository;
use crate::error::AuthServiceError;

// ── SetTfa ───────────────────────────────────────────────────────────────────

pub struct SetTfaUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> SetTfaUseCase<U> {
    /// Toggle the account's two-factor flag. A stored code is left as is; it
    /// is replaced on the next challenge.
    pub async fn execute(&self, user_id: Uuid, enabled: bool) -> Result<(), AuthServiceError> {
        if !self.users.set_tfa(user_id, enabled).await? {
            return Err(AuthServiceError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, enabled, "two-factor login toggled");
        Ok(())
    }
}

// ── SetLocale ────────────────────────────────────────────────────────────────

pub struct SetLocaleUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> SetLocaleUseCase<U> {
    /// Returns the parsed locale for the `locale` cookie.
    pub async fn execute(&self, user_id: Uuid, tag: &str) -> Result<Locale, AuthServiceError> {
        let locale = tag
            .parse::<Locale>()
            .map_err(|e| AuthServiceError::validation(e.to_string()))?;
        if !self.users.set_locale(user_id, locale).await? {
            return Err(AuthServiceError::UserNotFound);
        }
        Ok(locale)
    }
}
