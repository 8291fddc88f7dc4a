//! Email service for operations and position notifications.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.
//! Messages are composed up front into [`OutgoingMail`] so they can be
//! handed to the background [`MailQueue`](super::MailQueue).

use std::future::Future;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use people_core::Email;

use crate::config::EmailConfig;
use crate::models::{CurrentUser, PositionDetails, User};

pub const NEW_USER_SUBJECT: &str = "New user in the application.";
pub const NEW_POSITION_SUBJECT: &str = "New position";
pub const NEW_PRIMARY_SUBJECT: &str = "Primary role changed";

#[derive(Template)]
#[template(path = "email/new_user.html")]
struct NewUserEmailHtml<'a> {
    user: &'a User,
    profile_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_user.txt")]
struct NewUserEmailText<'a> {
    user: &'a User,
    profile_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/position.html")]
struct PositionEmailHtml<'a> {
    heading: &'a str,
    position: &'a PositionDetails,
    actor: &'a CurrentUser,
    profile_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/position.txt")]
struct PositionEmailText<'a> {
    heading: &'a str,
    position: &'a PositionDetails,
    actor: &'a CurrentUser,
    profile_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A fully rendered message waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Something that can deliver an [`OutgoingMail`].
pub trait MailDelivery: Send + Sync + 'static {
    fn deliver(&self, mail: &OutgoingMail) -> impl Future<Output = Result<(), EmailError>> + Send;
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(mail.to.clone()))?)
            .subject(&mail.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html.clone()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Email sent successfully");
        Ok(())
    }
}

impl MailDelivery for EmailService {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<(), EmailError> {
        self.send_multipart_email(mail).await
    }
}

fn profile_url(base_url: &str, user_id: impl std::fmt::Display) -> String {
    format!("{}/users/{user_id}", base_url.trim_end_matches('/'))
}

/// Tell operations that a user was added.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn new_user_mail(
    user: &User,
    notifications_email: &Email,
    base_url: &str,
) -> Result<OutgoingMail, EmailError> {
    let profile_url = profile_url(base_url, user.id);
    Ok(OutgoingMail {
        to: notifications_email.to_string(),
        subject: NEW_USER_SUBJECT.to_owned(),
        text: NewUserEmailText {
            user,
            profile_url: &profile_url,
        }
        .render()?,
        html: NewUserEmailHtml {
            user,
            profile_url: &profile_url,
        }
        .render()?,
    })
}

/// Tell a user they were given a new position.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn new_position_mail(
    position: &PositionDetails,
    actor: &CurrentUser,
    base_url: &str,
) -> Result<OutgoingMail, EmailError> {
    position_mail(NEW_POSITION_SUBJECT, "You have a new position", position, actor, base_url)
}

/// Tell a user their primary role changed.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn new_primary_mail(
    position: &PositionDetails,
    actor: &CurrentUser,
    base_url: &str,
) -> Result<OutgoingMail, EmailError> {
    position_mail(
        NEW_PRIMARY_SUBJECT,
        "Your primary role has changed",
        position,
        actor,
        base_url,
    )
}

fn position_mail(
    subject: &str,
    heading: &str,
    position: &PositionDetails,
    actor: &CurrentUser,
    base_url: &str,
) -> Result<OutgoingMail, EmailError> {
    let profile_url = profile_url(base_url, position.user_id);
    Ok(OutgoingMail {
        to: position.user_email.to_string(),
        subject: subject.to_owned(),
        text: PositionEmailText {
            heading,
            position,
            actor,
            profile_url: &profile_url,
        }
        .render()?,
        html: PositionEmailHtml {
            heading,
            position,
            actor,
            profile_url: &profile_url,
        }
        .render()?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use people_core::{PositionId, RoleId, UserId};

    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            name: "Ada <Lovelace>".into(),
            email: Email::parse("ada@people.test").unwrap(),
            admin: false,
            team_id: None,
            primary_role_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn position() -> PositionDetails {
        PositionDetails {
            id: PositionId::new(1),
            user_id: UserId::new(7),
            role_id: RoleId::new(2),
            starts_at: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            primary: false,
            user_name: "Ada".into(),
            user_email: Email::parse("ada@people.test").unwrap(),
            role_name: "developer".into(),
        }
    }

    fn actor() -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("boss@people.test").unwrap(),
            name: "Boss".into(),
            admin: true,
        }
    }

    #[test]
    fn test_new_user_mail_goes_to_operations() {
        let ops = Email::parse("ops@people.test").unwrap();
        let mail = new_user_mail(&user(), &ops, "https://people.test/").unwrap();

        assert_eq!(mail.to, "ops@people.test");
        assert_eq!(mail.subject, "New user in the application.");
        assert!(mail.text.contains("Ada <Lovelace>"));
        assert!(mail.text.contains("ada@people.test"));
        assert!(mail.text.contains("https://people.test/users/7"));
        assert!(mail.html.contains("Ada &#60;Lovelace&#62;") || mail.html.contains("Ada &lt;Lovelace&gt;"));
    }

    #[test]
    fn test_position_mails_go_to_the_position_owner() {
        let mail = new_position_mail(&position(), &actor(), "https://people.test").unwrap();
        assert_eq!(mail.to, "ada@people.test");
        assert_eq!(mail.subject, "New position");
        assert!(mail.text.contains("developer"));
        assert!(mail.text.contains("2026-04-01"));
        assert!(mail.text.contains("Boss"));

        let mail = new_primary_mail(&position(), &actor(), "https://people.test").unwrap();
        assert_eq!(mail.subject, "Primary role changed");
        assert!(mail.text.contains("Your primary role has changed"));
    }
}
