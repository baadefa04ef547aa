use chrono::Duration;

use scribe_auth::domain::password::verify_password;
use scribe_auth::error::AuthServiceError;
use scribe_auth::usecase::login::{LoginInput, LoginOutcome};
use scribe_auth::usecase::password::{
    ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};

use crate::helpers::{
    Harness, LinkKind, MockMailer, MockResetTokenStore, MockUserRepo, TEST_APP_URL, TEST_ORIGIN,
    TEST_PASSWORD, reset_policy, test_user,
};

const NEW_PASSWORD: &str = "new secret phrase";

fn forgot(
    users: &MockUserRepo,
    mailer: &MockMailer,
    tokens: &MockResetTokenStore,
) -> ForgotPasswordUseCase<MockUserRepo, MockMailer, MockResetTokenStore> {
    ForgotPasswordUseCase {
        users: users.clone(),
        mailer: mailer.clone(),
        tokens: tokens.clone(),
        policy: reset_policy(),
    }
}

fn reset(
    users: &MockUserRepo,
    tokens: &MockResetTokenStore,
) -> ResetPasswordUseCase<MockUserRepo, MockResetTokenStore> {
    ResetPasswordUseCase {
        users: users.clone(),
        tokens: tokens.clone(),
        policy: reset_policy(),
    }
}

fn reset_input(token: &str) -> ResetPasswordInput {
    ResetPasswordInput {
        email: "ada@example.com".to_owned(),
        token: token.to_owned(),
        password: NEW_PASSWORD.to_owned(),
        password_confirmation: NEW_PASSWORD.to_owned(),
    }
}

// ── Forgot ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mail_reset_link_and_store_only_token_hash() {
    let user = test_user(true);
    let users = MockUserRepo::new(vec![user.clone()]);
    let mailer = MockMailer::new();
    let tokens = MockResetTokenStore::new();

    forgot(&users, &mailer, &tokens)
        .execute("  ADA@example.com ")
        .await
        .unwrap();

    let links = mailer.links(LinkKind::PasswordReset);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].to, user.email);
    assert_eq!(links[0].locale, user.locale);
    assert!(links[0].link.starts_with(&format!("{TEST_APP_URL}/password/reset/")));
    // No security code goes out for a reset.
    assert!(mailer.sent().is_empty());

    let token = mailer.last_link_token(LinkKind::PasswordReset);
    let (record, ttl) = tokens.get_record(user.id).unwrap();
    assert_eq!(ttl, 60 * 60);
    assert_ne!(record.token_hash, token);
    assert!(verify_password(&token, &record.token_hash).unwrap());
}

#[tokio::test]
async fn should_report_unknown_email() {
    let users = MockUserRepo::new(vec![test_user(false)]);
    let mailer = MockMailer::new();

    let result = forgot(&users, &mailer, &MockResetTokenStore::new())
        .execute("nobody@example.com")
        .await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    assert!(mailer.links(LinkKind::PasswordReset).is_empty());
}

#[tokio::test]
async fn should_require_email_for_reset_link() {
    let result = forgot(
        &MockUserRepo::empty(),
        &MockMailer::new(),
        &MockResetTokenStore::new(),
    )
    .execute("   ")
    .await;
    assert!(matches!(result, Err(AuthServiceError::Validation(_))));
}

#[tokio::test]
async fn should_throttle_repeated_reset_requests() {
    let user = test_user(false);
    let users = MockUserRepo::new(vec![user.clone()]);
    let mailer = MockMailer::new();
    let tokens = MockResetTokenStore::new();
    let usecase = forgot(&users, &mailer, &tokens);

    usecase.execute(&user.email).await.unwrap();
    let result = usecase.execute(&user.email).await;
    match result {
        Err(AuthServiceError::TooManyAttempts { retry_after_secs }) => {
            assert!((1..=60).contains(&retry_after_secs));
        }
        other => panic!("expected TooManyAttempts, got {other:?}"),
    }
    assert_eq!(mailer.links(LinkKind::PasswordReset).len(), 1);

    tokens.age(user.id, Duration::seconds(61));
    usecase.execute(&user.email).await.unwrap();
    assert_eq!(mailer.links(LinkKind::PasswordReset).len(), 2);
}

#[tokio::test]
async fn should_discard_token_when_reset_mail_fails() {
    let user = test_user(false);
    let users = MockUserRepo::new(vec![user.clone()]);
    let tokens = MockResetTokenStore::new();

    let result = forgot(&users, &MockMailer::failing(), &tokens)
        .execute(&user.email)
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::DeliveryError(_))),
        "expected DeliveryError, got {result:?}"
    );
    assert!(tokens.get_record(user.id).is_none());
}

// ── Reset ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_and_consume_token() {
    let user = test_user(false);
    let users = MockUserRepo::new(vec![user.clone()]);
    let mailer = MockMailer::new();
    let tokens = MockResetTokenStore::new();
    forgot(&users, &mailer, &tokens)
        .execute(&user.email)
        .await
        .unwrap();
    let token = mailer.last_link_token(LinkKind::PasswordReset);

    reset(&users, &tokens)
        .execute(reset_input(&token))
        .await
        .unwrap();

    let stored = users.get(user.id);
    assert!(verify_password(NEW_PASSWORD, &stored.password_hash).unwrap());
    assert!(!verify_password(TEST_PASSWORD, &stored.password_hash).unwrap());
    assert!(tokens.get_record(user.id).is_none());

    let replay = reset(&users, &tokens).execute(reset_input(&token)).await;
    assert!(matches!(replay, Err(AuthServiceError::InvalidResetToken)));
}

#[tokio::test]
async fn should_keep_token_after_wrong_guess() {
    let user = test_user(false);
    let users = MockUserRepo::new(vec![user.clone()]);
    let mailer = MockMailer::new();
    let tokens = MockResetTokenStore::new();
    forgot(&users, &mailer, &tokens)
        .execute(&user.email)
        .await
        .unwrap();

    let result = reset(&users, &tokens)
        .execute(reset_input("not-the-token"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidResetToken)));
    assert!(tokens.get_record(user.id).is_some());
    assert!(verify_password(TEST_PASSWORD, &users.get(user.id).password_hash).unwrap());
}

#[tokio::test]
async fn should_reject_expired_token() {
    let user = test_user(false);
    let users = MockUserRepo::new(vec![user.clone()]);
    let mailer = MockMailer::new();
    let tokens = MockResetTokenStore::new();
    forgot(&users, &mailer, &tokens)
        .execute(&user.email)
        .await
        .unwrap();
    let token = mailer.last_link_token(LinkKind::PasswordReset);
    tokens.age(user.id, Duration::minutes(60));

    let result = reset(&users, &tokens).execute(reset_input(&token)).await;
    assert!(matches!(result, Err(AuthServiceError::InvalidResetToken)));
    assert!(tokens.get_record(user.id).is_none());
}

#[tokio::test]
async fn should_reject_reset_without_pending_request() {
    let users = MockUserRepo::new(vec![test_user(false)]);

    let result = reset(&users, &MockResetTokenStore::new())
        .execute(reset_input("anything"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidResetToken)));
}

#[tokio::test]
async fn should_validate_new_password_like_registration() {
    let users = MockUserRepo::new(vec![test_user(false)]);
    let tokens = MockResetTokenStore::new();

    let mut short = reset_input("t");
    short.password = "abc".to_owned();
    short.password_confirmation = "abc".to_owned();
    let mut mismatched = reset_input("t");
    mismatched.password_confirmation = "something else".to_owned();
    let mut tokenless = reset_input("");
    tokenless.token.clear();

    for input in [short, mismatched, tokenless] {
        let result = reset(&users, &tokens).execute(input).await;
        assert!(
            matches!(result, Err(AuthServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_still_require_code_after_reset() {
    let user = test_user(true);
    let h = Harness::new(vec![user.clone()]);
    let tokens = MockResetTokenStore::new();
    forgot(&h.users, &h.mailer, &tokens)
        .execute(&user.email)
        .await
        .unwrap();
    let token = h.mailer.last_link_token(LinkKind::PasswordReset);
    reset(&h.users, &tokens)
        .execute(reset_input(&token))
        .await
        .unwrap();

    let outcome = h
        .login()
        .execute(LoginInput {
            email: user.email.clone(),
            password: NEW_PASSWORD.to_owned(),
            remember: false,
            origin: TEST_ORIGIN.to_owned(),
        })
        .await
        .unwrap();
    assert!(
        matches!(outcome, LoginOutcome::ChallengeSent { .. }),
        "expected ChallengeSent, got {outcome:?}"
    );
}
