use std::time::Duration;

use anyhow::Context as _;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use scribe_domain::locale::Locale;

use crate::domain::repository::Mailer;
use crate::error::AuthServiceError;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Subject and plain-text body of an outgoing email.
#[derive(Debug, PartialEq, Eq)]
pub struct MailContent {
    pub subject: &'static str,
    pub body: String,
}

impl MailContent {
    pub fn tfa_code(locale: Locale, code: &str) -> Self {
        match locale {
            Locale::En => Self {
                subject: "Security code",
                body: format!(
                    "Your security code is {code}.\n\n\
                     Enter it to finish signing in. If you did not try to sign in, \
                     you can ignore this email."
                ),
            },
            Locale::De => Self {
                subject: "Sicherheitscode",
                body: format!(
                    "Ihr Sicherheitscode lautet {code}.\n\n\
                     Geben Sie ihn ein, um die Anmeldung abzuschließen. Wenn Sie sich \
                     nicht anmelden wollten, können Sie diese E-Mail ignorieren."
                ),
            },
            Locale::Es => Self {
                subject: "Código de seguridad",
                body: format!(
                    "Tu código de seguridad es {code}.\n\n\
                     Introdúcelo para completar el inicio de sesión. Si no intentaste \
                     iniciar sesión, puedes ignorar este correo."
                ),
            },
            Locale::Fr => Self {
                subject: "Code de sécurité",
                body: format!(
                    "Votre code de sécurité est {code}.\n\n\
                     Saisissez-le pour terminer la connexion. Si vous n'avez pas tenté \
                     de vous connecter, vous pouvez ignorer cet e-mail."
                ),
            },
        }
    }

    pub fn password_reset(locale: Locale, link: &str, expires_in_mins: u64) -> Self {
        match locale {
            Locale::En => Self {
                subject: "Reset password",
                body: format!(
                    "You are receiving this email because we received a password reset \
                     request for your account.\n\n{link}\n\n\
                     This link expires in {expires_in_mins} minutes. If you did not request a password \
                     reset, no further action is required."
                ),
            },
            Locale::De => Self {
                subject: "Passwort zurücksetzen",
                body: format!(
                    "Sie erhalten diese E-Mail, weil wir eine Anfrage zum Zurücksetzen \
                     des Passworts für Ihr Konto erhalten haben.\n\n{link}\n\n\
                     Dieser Link läuft in {expires_in_mins} Minuten ab. Wenn Sie kein neues Passwort \
                     angefordert haben, ist nichts weiter zu tun."
                ),
            },
            Locale::Es => Self {
                subject: "Restablecer contraseña",
                body: format!(
                    "Recibes este correo porque hemos recibido una solicitud para \
                     restablecer la contraseña de tu cuenta.\n\n{link}\n\n\
                     Este enlace caduca en {expires_in_mins} minutos. Si no solicitaste el cambio, \
                     no tienes que hacer nada."
                ),
            },
            Locale::Fr => Self {
                subject: "Réinitialisation du mot de passe",
                body: format!(
                    "Vous recevez cet e-mail car nous avons reçu une demande de \
                     réinitialisation du mot de passe de votre compte.\n\n{link}\n\n\
                     Ce lien expire dans {expires_in_mins} minutes. Si vous n'êtes pas à l'origine de \
                     cette demande, aucune action n'est requise."
                ),
            },
        }
    }

    pub fn email_verification(locale: Locale, link: &str) -> Self {
        match locale {
            Locale::En => Self {
                subject: "Verify email address",
                body: format!(
                    "Please open the link below to verify your email address.\n\n{link}\n\n\
                     If you did not create an account, no further action is required."
                ),
            },
            Locale::De => Self {
                subject: "E-Mail-Adresse bestätigen",
                body: format!(
                    "Bitte öffnen Sie den folgenden Link, um Ihre E-Mail-Adresse zu \
                     bestätigen.\n\n{link}\n\n\
                     Wenn Sie kein Konto erstellt haben, ist nichts weiter zu tun."
                ),
            },
            Locale::Es => Self {
                subject: "Verificar correo electrónico",
                body: format!(
                    "Abre el siguiente enlace para verificar tu dirección de correo.\n\n\
                     {link}\n\n\
                     Si no creaste una cuenta, no tienes que hacer nada."
                ),
            },
            Locale::Fr => Self {
                subject: "Vérification de l'adresse e-mail",
                body: format!(
                    "Veuillez ouvrir le lien ci-dessous pour vérifier votre adresse \
                     e-mail.\n\n{link}\n\n\
                     Si vous n'avez pas créé de compte, aucune action n'est requise."
                ),
            },
        }
    }
}

/// SMTP delivery over a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        from: &str,
    ) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .context("invalid SMTP relay")?
            .port(port)
            .timeout(Some(SMTP_TIMEOUT));
        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }
        let from = from.parse::<Mailbox>().context("invalid MAIL_FROM")?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl SmtpMailer {
    async fn deliver(&self, to: &str, mail: MailContent) -> Result<(), AuthServiceError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AuthServiceError::DeliveryError(e.to_string()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| AuthServiceError::DeliveryError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthServiceError::DeliveryError(e.to_string()))?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    async fn send_tfa_code(
        &self,
        to: &str,
        locale: Locale,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        self.deliver(to, MailContent::tfa_code(locale, code)).await
    }

    async fn send_password_reset(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
        expires_in_mins: u64,
    ) -> Result<(), AuthServiceError> {
        let mail = MailContent::password_reset(locale, link, expires_in_mins);
        self.deliver(to, mail).await
    }

    async fn send_email_verification(
        &self,
        to: &str,
        locale: Locale,
        link: &str,
    ) -> Result<(), AuthServiceError> {
        self.deliver(to, MailContent::email_verification(locale, link))
            .await
    }
}
