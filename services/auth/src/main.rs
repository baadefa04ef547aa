use sea_orm::Database;
use tracing::info;

use scribe_auth::config::AuthConfig;
use scribe_auth::infra::mail::SmtpMailer;
use scribe_auth::router::build_router;
use scribe_auth::state::AppState;
use scribe_auth::usecase::login::ThrottlePolicy;
use scribe_auth::usecase::register::RegistrationPolicy;
use scribe_core::config::Config;
use scribe_core::tracing::init_tracing;
use scribe_domain::locale::Locale;

#[tokio::main]
async fn main() {
    init_tracing("info,sqlx=warn");

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let smtp_credentials = config.smtp_username.clone().zip(config.smtp_password.clone());
    let mailer = SmtpMailer::new(
        &config.smtp_host,
        config.smtp_port,
        smtp_credentials,
        &config.mail_from,
    )
    .expect("invalid SMTP configuration");

    let tfa_policy = config
        .tfa_policy()
        .expect("invalid two-factor configuration");
    let password_reset_policy = config.password_reset_policy();
    let verification_policy = config.verification_policy();

    let state = AppState {
        db,
        redis,
        mailer,
        jwt_secret: config.jwt_secret,
        cookie_domain: config.cookie_domain,
        tfa_policy,
        throttle_policy: ThrottlePolicy {
            max_attempts: config.login_max_attempts,
            decay_secs: config.login_lockout_secs,
        },
        registration_policy: RegistrationPolicy {
            enabled: config.registration_enabled,
            tfa: config.registration_tfa,
            default_locale: Locale::from_tag_or_default(&config.default_locale),
        },
        password_reset_policy,
        verification_policy,
    };

    info!(
        login_tfa = state.tfa_policy.enabled,
        tfa_code_ttl_secs = state.tfa_policy.code_ttl_secs(),
        tfa_challenge_ttl_secs = state.tfa_policy.challenge_ttl_secs(),
        registration_verification = state.verification_policy.required,
        "two-factor login gate configured"
    );

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
