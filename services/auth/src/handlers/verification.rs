use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use scribe_auth_types::identity::IdentityHeaders;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::verification::{
    SendVerificationUseCase, VerificationNotice, VerifyEmailUseCase,
};

// ── POST /auth/email/verify ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    #[serde(default)]
    pub token: String,
}

pub async fn verify_email(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = VerifyEmailUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    usecase.execute(identity.user_id, &body.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /auth/email/verification-notification ───────────────────────────────

#[derive(Serialize)]
pub struct VerificationNoticeResponse {
    pub message: &'static str,
}

fn notice_response(notice: VerificationNotice) -> (StatusCode, Json<VerificationNoticeResponse>) {
    let (status, message) = match notice {
        VerificationNotice::Sent => (
            StatusCode::ACCEPTED,
            "A new verification link has been sent to your email address.",
        ),
        VerificationNotice::AlreadyVerified => {
            (StatusCode::OK, "Your email address is already verified.")
        }
    };
    (status, Json(VerificationNoticeResponse { message }))
}

pub async fn send_verification(
    State(state): State<AppState>,
    identity: IdentityHeaders,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = SendVerificationUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
        throttle: state.verification_throttle(),
        policy: state.verification_policy.clone(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let notice = usecase.execute(identity.user_id).await?;
    Ok(notice_response(notice))
}
