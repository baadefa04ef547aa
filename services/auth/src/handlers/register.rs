use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::session::session_response;
use crate::state::AppState;
use crate::usecase::register::{RegisterInput, RegisterUseCase};

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
    #[serde(default)]
    pub agreement: bool,
    pub locale: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
        policy: state.registration_policy,
        verification: state.verification_policy.clone(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let tokens = usecase
        .execute(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
            password_confirmation: body.password_confirmation,
            agreement: body.agreement,
            locale: body.locale,
        })
        .await?;

    Ok(session_response(jar, tokens, state.cookie_domain.clone()))
}
