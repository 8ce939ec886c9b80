use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("email provider returned status {0}")]
    Status(u16),
}

/// Transactional mail sender. All sends in this codebase are best-effort;
/// callers log failures and move on.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// HTTP client for the hosted email provider
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl HttpMailer {
    pub fn from_config() -> Self {
        let email = &config::config().email;
        Self {
            client: reqwest::Client::new(),
            endpoint: email.endpoint.clone(),
            api_key: email.api_key.clone(),
            from_address: email.from_address.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from_address,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Used when no provider key is configured (development, tests)
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::debug!("email sending disabled; would send '{}' to {}", subject, to);
        Ok(())
    }
}

/// Process-wide mailer, selected from configuration on first use
pub fn mailer() -> &'static dyn Mailer {
    use std::sync::OnceLock;
    static MAILER: OnceLock<Box<dyn Mailer>> = OnceLock::new();
    MAILER
        .get_or_init(|| {
            let email = &config::config().email;
            if email.api_key.is_empty() {
                Box::new(NoopMailer)
            } else {
                Box::new(HttpMailer::from_config())
            }
        })
        .as_ref()
}
