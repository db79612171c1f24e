//! Outbound delivery of verification links.
//!
//! Dispatch happens after the registration transaction commits and its
//! outcome never affects the created account.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub user_id: i32,
    pub username: String,
    pub token: String,
    pub link: String,
}

impl VerificationEmail {
    pub fn build(
        config: &EmailConfig,
        user_id: i32,
        username: &str,
        email: &str,
        token: &str,
    ) -> Result<Self> {
        let mut link = url::Url::parse(&config.verification_url)
            .with_context(|| format!("Invalid verification URL: {}", config.verification_url))?;
        link.query_pairs_mut().append_pair("token", token);

        let text = format!(
            "Hi {username},\n\nConfirm your email address by opening the link below. \
             It expires in {} minutes.\n\n{link}\n",
            config.token_expiration_after_minutes
        );

        Ok(Self {
            to: email.to_string(),
            subject: config.subject.clone(),
            text,
            user_id,
            username: username.to_string(),
            token: token.to_string(),
            link: link.to_string(),
        })
    }
}

#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_verification(&self, email: &VerificationEmail) -> Result<()>;
}

/// Writes the link to the log instead of sending anything.
pub struct LogMailer;

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send_verification(&self, email: &VerificationEmail) -> Result<()> {
        info!(
            user_id = email.user_id,
            to = %email.to,
            link = %email.link,
            "Verification email (log only)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    from: &'a str,
    #[serde(flatten)]
    email: &'a VerificationEmail,
}

/// POSTs each verification email as JSON to a relay endpoint.
pub struct WebhookMailer {
    client: reqwest::Client,
    url: String,
    sender: String,
}

impl WebhookMailer {
    pub fn new(url: impl Into<String>, sender: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Stockkeeper/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build mail webhook client")?;

        Ok(Self {
            client,
            url: url.into(),
            sender: sender.into(),
        })
    }
}

#[async_trait]
impl VerificationMailer for WebhookMailer {
    async fn send_verification(&self, email: &VerificationEmail) -> Result<()> {
        let body = WebhookBody {
            from: &self.sender,
            email,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Mail webhook request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Mail webhook returned {status}");
        }

        info!(user_id = email.user_id, to = %email.to, "Verification email sent");
        Ok(())
    }
}

pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn VerificationMailer>> {
    match config.webhook_url.as_deref().filter(|url| !url.trim().is_empty()) {
        Some(url) => Ok(Arc::new(WebhookMailer::new(
            url,
            config.sender.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )?)),
        None => Ok(Arc::new(LogMailer)),
    }
}
