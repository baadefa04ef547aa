use scribe_auth::domain::password::verify_password;
use scribe_auth::error::AuthServiceError;
use scribe_auth::usecase::register::{RegisterInput, RegisterUseCase, RegistrationPolicy};
use scribe_auth_types::token::{TokenKind, validate_token};
use scribe_domain::locale::Locale;

use crate::helpers::{
    LinkKind, MockMailer, MockUserRepo, TEST_APP_URL, TEST_JWT_SECRET, test_user,
    verification_policy,
};

fn policy() -> RegistrationPolicy {
    RegistrationPolicy {
        enabled: true,
        tfa: false,
        default_locale: Locale::En,
    }
}

fn usecase(
    users: &MockUserRepo,
    policy: RegistrationPolicy,
) -> RegisterUseCase<MockUserRepo, MockMailer> {
    verifying_usecase(users, &MockMailer::new(), policy, false)
}

fn verifying_usecase(
    users: &MockUserRepo,
    mailer: &MockMailer,
    policy: RegistrationPolicy,
    verification_required: bool,
) -> RegisterUseCase<MockUserRepo, MockMailer> {
    RegisterUseCase {
        users: users.clone(),
        mailer: mailer.clone(),
        policy,
        verification: verification_policy(verification_required),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

fn input() -> RegisterInput {
    RegisterInput {
        name: "Grace Hopper".to_owned(),
        email: "Grace@Example.com".to_owned(),
        password: "cobol-forever".to_owned(),
        password_confirmation: "cobol-forever".to_owned(),
        agreement: true,
        locale: None,
    }
}

#[tokio::test]
async fn should_create_account_and_sign_in() {
    let users = MockUserRepo::empty();

    let tokens = usecase(&users, policy()).execute(input()).await.unwrap();

    let stored = users.get(tokens.user_id);
    assert_eq!(stored.email, "grace@example.com");
    assert_eq!(stored.name, "Grace Hopper");
    assert_eq!(stored.locale, Locale::En);
    assert_eq!(stored.role, 0);
    assert!(!stored.tfa);
    assert!(verify_password("cobol-forever", &stored.password_hash).unwrap());
    assert!(tokens.refresh_token.is_none());
}

#[tokio::test]
async fn should_apply_initial_tfa_flag_and_locale() {
    let users = MockUserRepo::empty();
    let mut policy = policy();
    policy.tfa = true;
    let mut input = input();
    input.locale = Some("fr-CA".to_owned());

    let tokens = usecase(&users, policy).execute(input).await.unwrap();

    let stored = users.get(tokens.user_id);
    assert!(stored.tfa);
    assert_eq!(stored.locale, Locale::Fr);
}

#[tokio::test]
async fn should_reject_taken_email() {
    let users = MockUserRepo::new(vec![test_user(false)]);
    let mut input = input();
    input.email = "ADA@example.com".to_owned();

    let result = usecase(&users, policy()).execute(input).await;
    assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
}

#[tokio::test]
async fn should_refuse_when_registration_is_closed() {
    let users = MockUserRepo::empty();
    let mut policy = policy();
    policy.enabled = false;

    let result = usecase(&users, policy).execute(input()).await;
    assert!(matches!(result, Err(AuthServiceError::RegistrationClosed)));
}

#[tokio::test]
async fn should_validate_input() {
    let users = MockUserRepo::empty();
    let cases: Vec<(&str, Box<dyn Fn(&mut RegisterInput)>)> = vec![
        ("name", Box::new(|i: &mut RegisterInput| i.name = "  ".to_owned())),
        ("email", Box::new(|i: &mut RegisterInput| i.email = "not-an-email".to_owned())),
        ("password", Box::new(|i: &mut RegisterInput| {
            i.password = "short".to_owned();
            i.password_confirmation = "short".to_owned();
        })),
        ("confirmation", Box::new(|i: &mut RegisterInput| i.password_confirmation = "other-secret".to_owned())),
        ("agreement", Box::new(|i: &mut RegisterInput| i.agreement = false)),
        ("locale", Box::new(|i: &mut RegisterInput| i.locale = Some("pt".to_owned()))),
    ];

    for (field, mutate) in cases {
        let mut input = input();
        mutate(&mut input);
        let result = usecase(&users, policy()).execute(input).await;
        assert!(
            matches!(result, Err(AuthServiceError::Validation(_))),
            "{field}: expected Validation, got {result:?}"
        );
    }
    assert!(users.users.lock().unwrap().is_empty());
}

// ── Email verification ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_treat_address_as_verified_when_not_required() {
    let users = MockUserRepo::empty();
    let mailer = MockMailer::new();

    let tokens = verifying_usecase(&users, &mailer, policy(), false)
        .execute(input())
        .await
        .unwrap();

    assert!(users.get(tokens.user_id).email_verified_at.is_some());
    assert!(mailer.links(LinkKind::EmailVerification).is_empty());
}

#[tokio::test]
async fn should_mail_verification_link_when_required() {
    let users = MockUserRepo::empty();
    let mailer = MockMailer::new();

    let tokens = verifying_usecase(&users, &mailer, policy(), true)
        .execute(input())
        .await
        .unwrap();

    let stored = users.get(tokens.user_id);
    assert!(stored.email_verified_at.is_none());

    let links = mailer.links(LinkKind::EmailVerification);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].to, "grace@example.com");
    assert!(links[0].link.starts_with(&format!("{TEST_APP_URL}/email/verify/")));

    let token = mailer.last_link_token(LinkKind::EmailVerification);
    let claims = validate_token(&token, TEST_JWT_SECRET, TokenKind::EmailVerification).unwrap();
    assert_eq!(claims.sub, tokens.user_id.to_string());
}

#[tokio::test]
async fn should_register_even_when_verification_mail_fails() {
    let users = MockUserRepo::empty();
    let mailer = MockMailer::failing();

    let tokens = verifying_usecase(&users, &mailer, policy(), true)
        .execute(input())
        .await
        .unwrap();

    assert!(users.get(tokens.user_id).email_verified_at.is_none());
}
