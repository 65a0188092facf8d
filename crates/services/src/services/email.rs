//! Outgoing email. Delivery goes through an SMTP relay when one is
//! configured, otherwise through the Resend HTTP API; callers treat every
//! failure as soft.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::config::{Config, SmtpSettings};

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const WELCOME_SUBJECT: &str = "🎉 Welcome to HabitFlow - Start Your Journey!";

#[derive(Debug, Clone, Error)]
pub enum EmailError {
    #[error("No email service configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Transport(String),
    #[error("invalid email api key")]
    InvalidApiKey,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("smtp error: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Used when no delivery credentials are configured.
pub struct UnconfiguredEmail;

#[async_trait]
impl EmailSender for UnconfiguredEmail {
    async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

#[derive(Debug, Clone)]
pub struct ResendClient {
    http: Client,
    api_key: String,
}

impl ResendClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(api_key: String) -> Result<Self, EmailError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("habitflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(Self { http, api_key })
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let res = self
            .http
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        match res.status() {
            s if s.is_success() => {
                let id = res
                    .json::<ResendResponse>()
                    .await
                    .map(|r| r.id)
                    .unwrap_or_default();
                info!(email_id = %id, "Email accepted for delivery");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(EmailError::InvalidApiKey),
            s => Err(EmailError::Http {
                status: s.as_u16(),
                body: res.text().await.unwrap_or_default(),
            }),
        }
    }
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|e| EmailError::InvalidMessage(format!("invalid address \"{address}\": {e}")))
}

/// Render an HTML message for SMTP delivery.
pub fn to_mime(message: &EmailMessage) -> Result<Message, EmailError> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(&message.subject)
        .header(ContentType::TEXT_HTML);
    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }
    builder
        .body(message.html.clone())
        .map_err(|e| EmailError::InvalidMessage(e.to_string()))
}

/// Delivery through an authenticated SMTP relay. Port 465 uses implicit
/// TLS, any other port STARTTLS.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    pub fn new(settings: &SmtpSettings) -> Result<Self, EmailError> {
        let builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| EmailError::Smtp(e.to_string()))?;
        let credentials = Credentials::new(settings.user.clone(), settings.password.clone());
        Ok(Self {
            transport: builder
                .port(settings.port)
                .credentials(credentials)
                .build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = to_mime(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| EmailError::Smtp(e.to_string()))?;
        info!(code = %response.code(), "Email accepted by SMTP relay");
        Ok(())
    }
}

/// Which delivery path a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    Smtp,
    Resend,
    Unconfigured,
}

impl EmailBackend {
    pub fn for_config(config: &Config) -> Self {
        if config.smtp.is_some() {
            Self::Smtp
        } else if config.resend_api_key.is_some() {
            Self::Resend
        } else {
            Self::Unconfigured
        }
    }
}

/// Build the sender for `config`: SMTP first, Resend second.
pub fn sender_for(config: &Config) -> Result<Arc<dyn EmailSender>, EmailError> {
    Ok(match (&config.smtp, &config.resend_api_key) {
        (Some(smtp), _) => Arc::new(SmtpSender::new(smtp)?),
        (None, Some(key)) => Arc::new(ResendClient::new(key.clone())?),
        (None, None) => {
            warn!("No SMTP or Resend credentials set; welcome emails will not be delivered");
            Arc::new(UnconfiguredEmail)
        }
    })
}

/// Outcome reported back to the client after signup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDelivery {
    pub email_status: &'static str,
    pub email_error: Option<String>,
}

impl EmailDelivery {
    fn sent() -> Self {
        Self {
            email_status: "Email sent",
            email_error: None,
        }
    }

    fn failed(error: &EmailError) -> Self {
        Self {
            email_status: "Email failed",
            email_error: Some(error.to_string()),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.email_error.is_none()
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn welcome_email_html(name: &str, app_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Welcome to HabitFlow</title>
</head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #6366f1 0%, #8b5cf6 100%); color: white; text-align: center; padding: 40px 20px; border-radius: 10px 10px 0 0;">
      <h1>Welcome to HabitFlow!</h1>
    </div>
    <div style="background: white; padding: 30px; border-radius: 0 0 10px 10px;">
      <h2>Hi {name},</h2>
      <p>We're thrilled to have you join a community of people building better habits and reaching their goals.</p>
      <p>Here's what you can do with HabitFlow:</p>
      <ul>
        <li>Plan your day with today's and tomorrow's tasks</li>
        <li>Set reading, exercise, travel and weight goals</li>
        <li>Follow your progress day by day</li>
      </ul>
      <a href="{app_url}" style="display: inline-block; background: #6366f1; color: white; text-decoration: none; padding: 12px 24px; border-radius: 6px; font-weight: 600;">Get Started Now</a>
      <p style="text-align: center; color: #666; font-size: 14px; margin-top: 30px;">Best regards,<br>The HabitFlow Team</p>
    </div>
  </div>
</body>
</html>
"#,
        name = escape_html(name),
        app_url = escape_html(app_url),
    )
}

/// Send the signup welcome email. Never fails; the outcome is returned.
pub async fn send_welcome_email(
    sender: &dyn EmailSender,
    from: &str,
    to: &str,
    name: &str,
    app_url: &str,
) -> EmailDelivery {
    let message = EmailMessage {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: WELCOME_SUBJECT.to_string(),
        html: welcome_email_html(name, app_url),
    };
    match sender.send(&message).await {
        Ok(()) => EmailDelivery::sent(),
        Err(e) => {
            warn!(to = %to, error = %e, "Failed to send welcome email");
            EmailDelivery::failed(&e)
        }
    }
}
