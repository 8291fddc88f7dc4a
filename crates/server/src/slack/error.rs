//! Slack-related errors.

use thiserror::Error;

/// Errors that can occur when posting to a Slack webhook.
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP request failed before a response arrived.
    #[error("Slack request failed: {0}")]
    Request(String),

    /// The webhook answered with a non-success status.
    #[error("Slack webhook returned {status}: {body}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body (Slack explains rejections in plain text).
        body: String,
    },
}
