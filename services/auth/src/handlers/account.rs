use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use scribe_auth_types::{cookie::set_locale_cookie, identity::IdentityHeaders};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::account::{SetLocaleUseCase, SetTfaUseCase};

// ── PUT /auth/account/tfa ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetTfaRequest {
    pub enabled: bool,
}

pub async fn set_tfa(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<SetTfaRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = SetTfaUseCase {
        users: state.user_repo(),
    };
    usecase.execute(identity.user_id, body.enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /auth/account/locale ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetLocaleRequest {
    pub locale: String,
}

pub async fn set_locale(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    jar: CookieJar,
    Json(body): Json<SetLocaleRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = SetLocaleUseCase {
        users: state.user_repo(),
    };
    let locale = usecase.execute(identity.user_id, &body.locale).await?;
    let jar = set_locale_cookie(jar, locale.as_str().to_owned(), state.cookie_domain.clone());
    Ok((StatusCode::NO_CONTENT, jar))
}
