//! Delivery of confirmation codes
//!
//! With `email.enabled` the code is sent over SMTP. Otherwise it is written
//! to the log, which is enough for local development.

use crate::config::EmailConfig;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

const SUBJECT: &str = "Your confirmation code";

#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_confirmation_code(&self, to_email: &str, code: &str) -> Result<()>;
}

/// Pick the sender matching the configuration.
pub fn sender_from_config(config: &EmailConfig) -> Arc<dyn CodeSender> {
    if config.enabled {
        Arc::new(SmtpSender::new(config.clone()))
    } else {
        Arc::new(LogSender)
    }
}

pub struct SmtpSender {
    config: EmailConfig,
}

impl SmtpSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to_email: &str, code: &str) -> Result<Message> {
        Message::builder()
            .from(
                self.config
                    .from
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!("confirmation_code: {}", code))
            .map_err(|e| anyhow!("Failed to build email: {}", e))
    }
}

#[async_trait]
impl CodeSender for SmtpSender {
    async fn send_confirmation_code(&self, to_email: &str, code: &str) -> Result<()> {
        let email = self.build_message(to_email, code)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }

        builder
            .build()
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::debug!("Sent confirmation code to {}", to_email);
        Ok(())
    }
}

/// Writes codes to the log instead of sending them.
pub struct LogSender;

#[async_trait]
impl CodeSender for LogSender {
    async fn send_confirmation_code(&self, to_email: &str, code: &str) -> Result<()> {
        tracing::info!("Email delivery disabled, confirmation code for {}: {}", to_email, code);
        Ok(())
    }
}
