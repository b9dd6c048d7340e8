//! Outbound transactional mail over SMTP via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(credentials)
            .build();
        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Body of the password-reset mail. No templating engine; the link embeds
/// the single-use token.
pub fn reset_email_html(frontend_url: &str, reset_token: &str) -> String {
    format!(
        concat!(
            "<div style=\"font-family: sans-serif; line-height: 2; font-size: 16px;\">",
            "<h2>Your password reset token is here.</h2>",
            "<p><a href=\"{base}/reset?resetToken={token}\">Click here to reset your password.</a></p>",
            "<p>This link is valid for one hour and can be used once.</p>",
            "</div>"
        ),
        base = frontend_url.trim_end_matches('/'),
        token = reset_token,
    )
}
