//! Slack incoming-webhook client.
//!
//! Posts `{"text": ..., "username": ...}` to the configured webhook URL.

use std::future::Future;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error, instrument};

use super::error::SlackError;
use crate::config::SlackConfig;

/// Destination for plain-text chat notifications.
pub trait ChatSink: Send + Sync {
    /// Send one message.
    fn ping(&self, text: &str) -> impl Future<Output = Result<(), SlackError>> + Send;
}

/// Webhook payload.
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
    username: &'a str,
}

/// Slack client bound to one incoming webhook.
#[derive(Clone)]
pub struct SlackWebhookClient {
    /// HTTP client.
    client: Client,
    /// Incoming webhook URL (embeds the credential).
    webhook_url: SecretString,
    /// Display name messages are posted under.
    username: String,
}

impl std::fmt::Debug for SlackWebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebhookClient")
            .field("webhook_url", &"[REDACTED]")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SlackWebhookClient {
    /// Create a new webhook client.
    #[must_use]
    pub fn new(webhook_url: SecretString, username: String) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            username,
        }
    }

    /// Create a client from loaded configuration.
    #[must_use]
    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.webhook_url.clone(), config.username.clone())
    }

    /// Display name messages are posted under.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Post a plain-text message.
    ///
    /// # Errors
    ///
    /// Returns `SlackError::Request` if the request cannot be sent and
    /// `SlackError::Response` if the webhook rejects it.
    #[instrument(skip(self, text), fields(username = %self.username))]
    pub async fn post_text(&self, text: &str) -> Result<(), SlackError> {
        let message = WebhookMessage {
            text,
            username: &self.username,
        };

        let response = self
            .client
            .post(self.webhook_url.expose_secret())
            .json(&message)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Slack webhook rejected message");
            return Err(SlackError::Response {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Message posted to Slack webhook");
        Ok(())
    }
}

impl ChatSink for SlackWebhookClient {
    async fn ping(&self, text: &str) -> Result<(), SlackError> {
        self.post_text(text).await
    }
}
