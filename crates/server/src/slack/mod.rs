//! Slack integration for project notifications.
//!
//! This module provides:
//! - [`SlackWebhookClient`] for posting plain-text messages to an incoming webhook
//! - [`ChatSink`], the seam the project notifier sends through
//!
//! Messages are fire-and-forget: a failed post is reported to the caller,
//! which logs it and carries on.

mod client;
mod error;

pub use client::{ChatSink, SlackWebhookClient};
pub use error::SlackError;
