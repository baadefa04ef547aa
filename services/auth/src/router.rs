use axum::{
    Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use scribe_core::error::not_found;
use scribe_core::health::healthz;
use scribe_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    account::{set_locale, set_tfa},
    health::readyz,
    login::{confirm_tfa, login, resend_tfa},
    password::{forgot_password, reset_password},
    register::register,
    session::{check_session, end_session, refresh_session},
    verification::{send_verification, verify_email},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Registration
        .route("/auth/register", post(register))
        // Login + two-factor gate
        .route("/auth/login", post(login))
        .route("/auth/login/tfa", post(confirm_tfa))
        .route("/auth/login/tfa/resend", post(resend_tfa))
        // Password reset
        .route("/auth/password/forgot", post(forgot_password))
        .route("/auth/password/reset", post(reset_password))
        // Email verification
        .route("/auth/email/verify", post(verify_email))
        .route(
            "/auth/email/verification-notification",
            post(send_verification),
        )
        // Session
        .route(
            "/auth/session",
            get(check_session).patch(refresh_session).delete(end_session),
        )
        // Account settings
        .route("/auth/account/tfa", put(set_tfa))
        .route("/auth/account/locale", put(set_locale))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
