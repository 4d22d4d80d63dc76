use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Outbound email collaborator. Delivery is fire-and-forget; a failure is
/// logged and never blocks the request that triggered it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SMTP delivery over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(host: &str, username: Option<&str>, password: Option<&str>, from: &str) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?;
        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .body(body.to_string())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP relay is configured: logs instead of delivering, so
/// local development still surfaces the codes.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        info!(to = %to, subject = %subject, "SMTP not configured; mail logged only");
        Ok(())
    }
}

/// Builds the mailer the config calls for.
pub fn setup_mailer(config: &AppConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &config.smtp_host {
        Some(host) => {
            info!("📧 Mailer: SMTP via {}", host);
            Ok(Arc::new(SmtpMailer::new(
                host,
                config.smtp_username.as_deref(),
                config.smtp_password.as_deref(),
                &config.mail_from,
            )?))
        }
        None => {
            warn!("📧 Mailer: SMTP_HOST not set, OTP mail will be logged only");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Sends an OTP message in the background. The account write has already
/// committed by the time this runs, so delivery failure only logs.
pub fn send_otp_email(mailer: Arc<dyn Mailer>, to: String, username: String, subject: &'static str, otp: String) {
    tokio::spawn(async move {
        let body = format!(
            "Hi {}, your OTP is {}. It expires in 10 minutes.",
            username, otp
        );
        if let Err(e) = mailer.send(&to, subject, &body).await {
            tracing::error!("Failed to send OTP email to {}: {}", to, e);
        }
    });
}
