use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("these credentials do not match our records")]
    InvalidCredentials,
    #[error("too many login attempts, retry in {retry_after_secs} seconds")]
    TooManyAttempts { retry_after_secs: u64 },
    #[error("the security code is incorrect")]
    InvalidCode,
    #[error("the security code is expired")]
    ExpiredCode,
    #[error("no pending security code challenge")]
    ChallengeNotFound,
    #[error("{0}")]
    DeliveryError(String),
    #[error("{0}")]
    Validation(String),
    #[error("the email has already been taken")]
    EmailTaken,
    #[error("registration is disabled")]
    RegistrationClosed,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("this password reset token is invalid")]
    InvalidResetToken,
    #[error("this verification link is invalid or has expired")]
    InvalidVerificationToken,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TooManyAttempts { .. } => "TOO_MANY_ATTEMPTS",
            Self::InvalidCode => "INVALID_CODE",
            Self::ExpiredCode => "EXPIRED_CODE",
            Self::ChallengeNotFound => "CHALLENGE_NOT_FOUND",
            Self::DeliveryError(_) => "DELIVERY_FAILED",
            Self::Validation(_) => "VALIDATION",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::InvalidVerificationToken => "INVALID_VERIFICATION_TOKEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials
            | Self::ChallengeNotFound
            | Self::InvalidToken
            | Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Self::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidCode
            | Self::ExpiredCode
            | Self::Validation(_)
            | Self::InvalidResetToken => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DeliveryError(_) => StatusCode::BAD_GATEWAY,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::RegistrationClosed | Self::InvalidVerificationToken => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer records method/uri/status for every request; 4xx are
        // expected client errors. Internal errors need the anyhow chain.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
            }
            Self::DeliveryError(e) => {
                tracing::warn!(error = %e, kind = "DELIVERY_FAILED", "mail delivery failed");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let mut response = (status, axum::Json(body)).into_response();
        if let Self::TooManyAttempts { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
