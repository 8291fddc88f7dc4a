//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::MailQueue;
use crate::slack::SlackWebhookClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    slack: Option<SlackWebhookClient>,
    mail: MailQueue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The Slack client is built only when a webhook URL is configured.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, mail: MailQueue) -> Self {
        let slack = config.slack().map(SlackWebhookClient::from_config);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                slack,
                mail,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Slack webhook client, if configured.
    #[must_use]
    pub fn slack(&self) -> Option<&SlackWebhookClient> {
        self.inner.slack.as_ref()
    }

    #[must_use]
    pub fn mail(&self) -> &MailQueue {
        &self.inner.mail
    }
}
