use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::repo_types::ContactSubmission;
use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("email api returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Out-of-band notice that a contact form arrived.
#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifyError>;
}

/// Used when no email API is configured.
pub struct DisabledNotifier;

#[async_trait]
impl ContactNotifier for DisabledNotifier {
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifyError> {
        debug!(contact_id = %submission.id, "email notifications disabled");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    reply_to: &'a str,
    subject: String,
    text: String,
}

/// Sends through a Resend-compatible `POST /emails` API.
pub struct EmailNotifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    to: String,
}

impl EmailNotifier {
    pub fn new(api_url: String, api_key: String, from: String, to: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, api_url, api_key, from, to }
    }

    /// `None` unless both an API key and a recipient are configured.
    pub fn from_config(cfg: &EmailConfig) -> Option<Self> {
        let api_key = cfg.api_key.clone()?;
        let to = cfg.notify_to.clone()?;
        Some(Self::new(cfg.api_url.clone(), api_key, cfg.from.clone(), to))
    }
}

pub(crate) fn render(submission: &ContactSubmission) -> (String, String) {
    let subject = format!("[Contact] {}", submission.subject);
    let text = format!(
        "From: {} {} <{}>\n\n{}",
        submission.first_name, submission.last_name, submission.email, submission.message
    );
    (subject, text)
}

#[async_trait]
impl ContactNotifier for EmailNotifier {
    #[instrument(skip_all, fields(contact_id = %submission.id))]
    async fn notify(&self, submission: &ContactSubmission) -> Result<(), NotifyError> {
        let (subject, text) = render(submission);
        let payload = EmailPayload {
            from: &self.from,
            to: vec![&self.to],
            reply_to: &submission.email,
            subject,
            text,
        };

        let res = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        info!("contact notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn config(api_key: Option<&str>, notify_to: Option<&str>) -> EmailConfig {
        EmailConfig {
            api_key: api_key.map(Into::into),
            api_url: "https://api.resend.com/emails".into(),
            from: "noreply@pkmatchz.com".into(),
            notify_to: notify_to.map(Into::into),
        }
    }

    #[test]
    fn needs_key_and_recipient() {
        assert!(EmailNotifier::from_config(&config(None, Some("ops@pkmatchz.com"))).is_none());
        assert!(EmailNotifier::from_config(&config(Some("re_123"), None)).is_none());
        assert!(EmailNotifier::from_config(&config(Some("re_123"), Some("ops@pkmatchz.com"))).is_some());
    }

    #[test]
    fn render_includes_sender_and_message() {
        let submission = ContactSubmission {
            id: Uuid::new_v4(),
            first_name: "Larry".into(),
            last_name: "Page".into(),
            email: "larry@example.com".into(),
            subject: "Partnership".into(),
            message: "Let's talk.".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let (subject, text) = render(&submission);
        assert_eq!(subject, "[Contact] Partnership");
        assert!(text.contains("Larry Page <larry@example.com>"));
        assert!(text.ends_with("Let's talk."));
    }
}
