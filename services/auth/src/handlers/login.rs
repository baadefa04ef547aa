use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use scribe_auth_types::cookie::{
    SCRIBE_TFA_CHALLENGE, clear_tfa_challenge_cookie, set_tfa_challenge_cookie,
};

use crate::error::AuthServiceError;
use crate::handlers::origin::ClientOrigin;
use crate::handlers::session::session_response;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginOutcome, LoginUseCase};
use crate::usecase::session::SessionTokens;
use crate::usecase::tfa::{ConfirmTfaInput, ConfirmTfaUseCase, ResendTfaUseCase};

const RESENT_MESSAGE: &str = "A new security code has been sent to your email address.";

fn challenge_id(jar: &CookieJar) -> Result<String, AuthServiceError> {
    jar.get(SCRIBE_TFA_CHALLENGE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(AuthServiceError::ChallengeNotFound)
}

/// Errors after which the pending challenge is gone and the client must
/// restart at login.
fn ends_challenge(err: &AuthServiceError) -> bool {
    matches!(
        err,
        AuthServiceError::ChallengeNotFound | AuthServiceError::DeliveryError(_)
    )
}

/// Cookie handling shared by the login endpoints.
struct ChallengeCookies {
    domain: String,
    ttl_secs: u64,
}

impl ChallengeCookies {
    fn from_state(state: &AppState) -> Self {
        Self {
            domain: state.cookie_domain.clone(),
            ttl_secs: state.tfa_policy.challenge_ttl_secs(),
        }
    }

    /// 201 with a session, or 202 with the challenge cookie. Errors carry no
    /// challenge cookie.
    fn login(
        &self,
        jar: CookieJar,
        outcome: Result<LoginOutcome, AuthServiceError>,
    ) -> Response {
        match outcome {
            Ok(LoginOutcome::Authenticated(tokens)) => {
                session_response(jar, tokens, self.domain.clone())
            }
            Ok(LoginOutcome::ChallengeSent { challenge_id }) => {
                let jar =
                    set_tfa_challenge_cookie(jar, challenge_id, self.domain.clone(), self.ttl_secs);
                let body = ChallengeResponse { tfa_required: true };
                (StatusCode::ACCEPTED, jar, Json(body)).into_response()
            }
            Err(e) => e.into_response(),
        }
    }

    /// Session on success. A wrong or expired code keeps the challenge cookie.
    fn confirm(
        &self,
        jar: CookieJar,
        result: Result<SessionTokens, AuthServiceError>,
    ) -> Response {
        match result {
            Ok(tokens) => {
                let jar = clear_tfa_challenge_cookie(jar, self.domain.clone());
                session_response(jar, tokens, self.domain.clone())
            }
            Err(e) => self.failure(jar, e),
        }
    }

    /// A successful resend extends the cookie alongside the challenge record.
    fn resend(
        &self,
        jar: CookieJar,
        challenge_id: String,
        result: Result<(), AuthServiceError>,
    ) -> Response {
        match result {
            Ok(()) => {
                let jar =
                    set_tfa_challenge_cookie(jar, challenge_id, self.domain.clone(), self.ttl_secs);
                let body = ResendResponse {
                    message: RESENT_MESSAGE,
                };
                (StatusCode::OK, jar, Json(body)).into_response()
            }
            Err(e) => self.failure(jar, e),
        }
    }

    fn failure(&self, jar: CookieJar, err: AuthServiceError) -> Response {
        if ends_challenge(&err) {
            (clear_tfa_challenge_cookie(jar, self.domain.clone()), err).into_response()
        } else {
            err.into_response()
        }
    }
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

/// Missing fields deserialize as empty so the usecase reports them in the
/// common error envelope.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub tfa_required: bool,
}

pub async fn login(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Response {
    let usecase = LoginUseCase {
        gate: state.tfa_gate(),
        challenges: state.challenge_store(),
        throttle: state.login_throttle(),
        throttle_policy: state.throttle_policy,
        jwt_secret: state.jwt_secret.clone(),
    };

    let outcome = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
            remember: body.remember,
            origin,
        })
        .await;

    ChallengeCookies::from_state(&state).login(jar, outcome)
}

// ── POST /auth/login/tfa ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmTfaRequest {
    #[serde(default)]
    pub code: Option<Value>,
}

/// `code` is required and must be an integer: a JSON number or a string of
/// ASCII digits.
fn parse_code(code: Option<&Value>) -> Result<u32, AuthServiceError> {
    let required = || AuthServiceError::validation("the code field is required");
    let not_integer = || AuthServiceError::validation("the code must be an integer");
    match code {
        None | Some(Value::Null) => Err(required()),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(not_integer),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(required());
            }
            if !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(not_integer());
            }
            // Anything too long for u32 cannot match a six-digit code.
            s.parse::<u32>().map_err(|_| AuthServiceError::InvalidCode)
        }
        Some(_) => Err(not_integer()),
    }
}

pub async fn confirm_tfa(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<ConfirmTfaRequest>,
) -> Result<Response, AuthServiceError> {
    let challenge_id = challenge_id(&jar)?;
    let code = parse_code(body.code.as_ref())?;

    let usecase = ConfirmTfaUseCase {
        gate: state.tfa_gate(),
        challenges: state.challenge_store(),
        throttle: state.login_throttle(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let result = usecase
        .execute(ConfirmTfaInput { challenge_id, code })
        .await;

    Ok(ChallengeCookies::from_state(&state).confirm(jar, result))
}

// ── POST /auth/login/tfa/resend ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ResendResponse {
    pub message: &'static str,
}

pub async fn resend_tfa(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AuthServiceError> {
    let challenge_id = challenge_id(&jar)?;

    let usecase = ResendTfaUseCase {
        gate: state.tfa_gate(),
        challenges: state.challenge_store(),
    };
    let result = usecase.execute(&challenge_id).await;

    Ok(ChallengeCookies::from_state(&state).resend(jar, challenge_id, result))
}
