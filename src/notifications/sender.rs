use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::NotificationsConfig;
use crate::db::{NotificationChannel, OutboxNotification};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("sender not configured for {0:?}")]
    NotConfigured(NotificationChannel),
    #[error("provider request failed: {0}")]
    Provider(String),
}

/// One-shot delivery of a single outbox row. Implementations never retry;
/// retry policy belongs to the outbox worker.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &OutboxNotification) -> Result<(), SendError>;
}

/// HTTP senders: a Resend-style JSON API for email and a form-encoded SMS
/// gateway. Both carry bounded request timeouts.
pub struct HttpNotificationSender {
    http: reqwest::Client,
    config: NotificationsConfig,
}

impl HttpNotificationSender {
    pub fn new(config: NotificationsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    async fn send_email(&self, notification: &OutboxNotification) -> Result<(), SendError> {
        let url = format!("{}/emails", self.config.email_api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.email_api_key.expose_secret())
            .json(&json!({
                "from": self.config.email_from,
                "to": [notification.recipient],
                "subject": notification.subject.as_deref().unwrap_or("movi-lab"),
                "text": notification.body,
            }))
            .send()
            .await
            .map_err(|e| SendError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SendError::Provider(format!(
                "email provider returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn send_sms(&self, notification: &OutboxNotification) -> Result<(), SendError> {
        let (Some(base), Some(key), Some(from)) = (
            self.config.sms_api_base.as_ref(),
            self.config.sms_api_key.as_ref(),
            self.config.sms_from.as_ref(),
        ) else {
            return Err(SendError::NotConfigured(NotificationChannel::Sms));
        };

        let url = format!("{base}/messages");
        let response = self
            .http
            .post(&url)
            .bearer_auth(key.expose_secret())
            .form(&[
                ("To", notification.recipient.as_str()),
                ("From", from.as_str()),
                ("Body", notification.body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SendError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SendError::Provider(format!(
                "sms provider returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for HttpNotificationSender {
    async fn send(&self, notification: &OutboxNotification) -> Result<(), SendError> {
        match notification.channel {
            NotificationChannel::Email => self.send_email(notification).await,
            NotificationChannel::Sms => self.send_sms(notification).await,
        }
    }
}
