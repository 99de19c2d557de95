//! Verification code delivery over SMTP

use std::time::Duration;

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

type SendResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Email configuration
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub send_timeout: Duration,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            smtp_host: std::env::var("SMTP_HOST").ok()?,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok()?,
            smtp_password: std::env::var("SMTP_PASSWORD").ok()?,
            from_email: std::env::var("FROM_EMAIL").ok()?,
            from_name: std::env::var("FROM_NAME")
                .unwrap_or_else(|_| "Campus Commons".to_string()),
            send_timeout: Duration::from_secs(
                std::env::var("SMTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }
}

/// SMTP-backed sender
pub struct EmailService {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { config, mailer })
    }

    /// Send a password-change verification code. Bounded by the configured
    /// send timeout so a stalled relay cannot hold the request open.
    pub async fn send_verification_code(&self, to_email: &str, code: &str) -> SendResult {
        let email = Message::builder()
            .from(format!("{} <{}>", self.config.from_name, self.config.from_email).parse()?)
            .to(to_email.parse()?)
            .subject("Password Change Verification Code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your verification code is: {}", code))?;

        match tokio::time::timeout(self.config.send_timeout, self.mailer.send(email)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Box::new(e)),
            Err(_) => Err("SMTP send timed out".into()),
        }
    }
}

/// Sender used when SMTP is not configured: logs the message instead of
/// delivering it, so local development still works end to end.
pub struct MockEmailService;

impl MockEmailService {
    pub async fn send_verification_code(&self, to_email: &str, code: &str) -> SendResult {
        log::info!(
            "[MOCK EMAIL] Verification code for {}: {}",
            to_email,
            code
        );
        Ok(())
    }
}

/// Unified sender selected at startup
pub enum EmailSender {
    Real(EmailService),
    Mock(MockEmailService),
}

impl EmailSender {
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(config) => match EmailService::new(config) {
                Ok(service) => EmailSender::Real(service),
                Err(e) => {
                    log::warn!("Failed to initialize email service: {}. Using mock.", e);
                    EmailSender::Mock(MockEmailService)
                }
            },
            None => {
                log::info!("Email not configured. Using mock email service.");
                EmailSender::Mock(MockEmailService)
            }
        }
    }

    pub fn mock() -> Self {
        EmailSender::Mock(MockEmailService)
    }

    pub async fn send_verification_code(&self, to_email: &str, code: &str) -> SendResult {
        match self {
            EmailSender::Real(service) => service.send_verification_code(to_email, code).await,
            EmailSender::Mock(mock) => mock.send_verification_code(to_email, code).await,
        }
    }
}
