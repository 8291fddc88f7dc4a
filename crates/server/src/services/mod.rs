//! Business logic services.
//!
//! # Services
//!
//! - `email` - Email composition and delivery via SMTP
//! - `mail_queue` - Background mail delivery with bounded retries
//! - `policy` - Authorization rules
//! - `project_notifier` - Chat message when project dates change

pub mod email;
pub mod mail_queue;
pub mod policy;
pub mod project_notifier;

pub use email::{EmailError, EmailService, MailDelivery, OutgoingMail};
pub use mail_queue::{MailQueue, MailQueueError};
pub use policy::{Action, Resource, authorize};
pub use project_notifier::{notify_if_dates_changed, notify_project_update};
