use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use scribe_auth_types::{
    cookie::{
        SCRIBE_ACCESS_TOKEN, SCRIBE_REFRESH_TOKEN, clear_session_cookies,
        set_access_token_cookie, set_refresh_token_cookie,
    },
    identity::IdentityHeaders,
    token::validate_access_token,
};

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::session::{RefreshSessionUseCase, SessionTokens};

const X_SCRIBE_ACCESS_TOKEN_EXPIRES: &str = "x-scribe-access-token-expires";

fn token_expires_headers(exp: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_SCRIBE_ACCESS_TOKEN_EXPIRES),
        HeaderValue::from(exp),
    );
    headers
}

/// `201 Created` with the session cookies and expiry header.
pub(crate) fn session_response(
    jar: CookieJar,
    tokens: SessionTokens,
    cookie_domain: String,
) -> Response {
    let mut jar = set_access_token_cookie(jar, tokens.access_token, cookie_domain.clone());
    if let Some(refresh_token) = tokens.refresh_token {
        jar = set_refresh_token_cookie(jar, refresh_token, cookie_domain);
    }
    (
        StatusCode::CREATED,
        jar,
        token_expires_headers(tokens.access_token_exp),
    )
        .into_response()
}

// ── GET /auth/session ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CheckSessionQuery {
    pub role: Option<u8>,
}

#[derive(Serialize)]
pub struct CheckSessionResponse {
    pub user_id: uuid::Uuid,
    pub user_role: u8,
    pub access_token_exp: u64,
}

pub async fn check_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CheckSessionQuery>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let token_value = jar
        .get(SCRIBE_ACCESS_TOKEN)
        .map(|c| c.value().to_owned())
        .ok_or(AuthServiceError::InvalidToken)?;

    let info = validate_access_token(&token_value, &state.jwt_secret)
        .map_err(|_| AuthServiceError::InvalidToken)?;

    if query.role.is_some_and(|min_role| info.user_role < min_role) {
        return Err(AuthServiceError::InvalidToken);
    }

    let headers = token_expires_headers(info.access_token_exp);
    let body = CheckSessionResponse {
        user_id: info.user_id,
        user_role: info.user_role,
        access_token_exp: info.access_token_exp,
    };
    Ok((StatusCode::OK, headers, Json(body)))
}

// ── PATCH /auth/session ───────────────────────────────────────────────────────

pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let refresh_value = jar
        .get(SCRIBE_REFRESH_TOKEN)
        .map(|c| c.value().to_owned())
        .ok_or(AuthServiceError::InvalidRefreshToken)?;

    let usecase = RefreshSessionUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let tokens = usecase.execute(&refresh_value).await?;

    Ok(session_response(jar, tokens, state.cookie_domain.clone()))
}

// ── DELETE /auth/session ──────────────────────────────────────────────────────

pub async fn end_session(
    State(state): State<AppState>,
    _identity: IdentityHeaders,
    jar: CookieJar,
) -> impl IntoResponse {
    let jar = clear_session_cookies(jar, state.cookie_domain.clone());
    (StatusCode::NO_CONTENT, jar)
}
