use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::password::{ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase};

const RESET_LINK_SENT: &str = "We have emailed your password reset link.";

// ── POST /auth/password/forgot ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ForgotPasswordUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
        tokens: state.reset_token_store(),
        policy: state.password_reset_policy.clone(),
    };
    usecase.execute(&body.email).await?;

    let body = ForgotPasswordResponse {
        message: RESET_LINK_SENT,
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

// ── POST /auth/password/reset ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        tokens: state.reset_token_store(),
        policy: state.password_reset_policy.clone(),
    };
    usecase
        .execute(ResetPasswordInput {
            email: body.email,
            token: body.token,
            password: body.password,
            password_confirmation: body.password_confirmation,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
