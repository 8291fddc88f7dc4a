//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PEOPLE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PEOPLE_BASE_URL` - Public URL of the application
//! - `PEOPLE_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address
//! - `NOTIFICATIONS_EMAIL` - Operations address told about new users
//!
//! ## Optional
//! - `PEOPLE_HOST` - Bind address (default: 127.0.0.1)
//! - `PEOPLE_PORT` - Listen port (default: 3000)
//! - `PEOPLE_AUTH_HEADER` - Header carrying the proxy-authenticated email
//!   (default: x-forwarded-email)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (Slack - enables project date notifications)
//! - `SLACK_WEBHOOK_URL` - Incoming webhook URL
//! - `SLACK_USERNAME` - Bot display name (default: `PeopleApp`)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use people_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SLACK_USERNAME: &str = "PeopleApp";
const DEFAULT_AUTH_HEADER: &str = "x-forwarded-email";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the application
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Header set by the authenticating proxy
    pub auth_header: String,
    /// Slack webhook configuration (optional)
    pub slack: Option<SlackConfig>,
    /// Email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Slack incoming-webhook configuration.
///
/// The webhook URL embeds its own credential, so `Debug` only shows the host.
#[derive(Clone)]
pub struct SlackConfig {
    /// Incoming webhook URL.
    pub webhook_url: SecretString,
    /// Display name the messages are posted under.
    pub username: String,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("webhook_url", &"[REDACTED]")
            .field("username", &self.username)
            .finish()
    }
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Operations address notified about new users
    pub notifications_email: Email,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("notifications_email", &self.notifications_email)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PEOPLE_DATABASE_URL")?;
        let host = get_env_or_default("PEOPLE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PEOPLE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PEOPLE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PEOPLE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("PEOPLE_BASE_URL")?;
        let session_secret = get_validated_secret("PEOPLE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "PEOPLE_SESSION_SECRET")?;
        let auth_header = get_env_or_default("PEOPLE_AUTH_HEADER", DEFAULT_AUTH_HEADER)
            .to_ascii_lowercase();

        let slack = SlackConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            auth_header,
            slack,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the Slack configuration, if available.
    ///
    /// Returns `None` if `SLACK_WEBHOOK_URL` is not set, which disables
    /// project date notifications.
    #[must_use]
    pub const fn slack(&self) -> Option<&SlackConfig> {
        self.slack.as_ref()
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SlackConfig {
    /// Load Slack configuration from environment.
    ///
    /// Returns `Ok(None)` if `SLACK_WEBHOOK_URL` is not set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(webhook_url) = get_optional_env("SLACK_WEBHOOK_URL") else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            &webhook_url,
            get_env_or_default("SLACK_USERNAME", DEFAULT_SLACK_USERNAME),
        )?))
    }

    /// Build a Slack configuration, checking the webhook URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn new(webhook_url: &str, username: String) -> Result<Self, ConfigError> {
        let parsed = Url::parse(webhook_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SLACK_WEBHOOK_URL".to_string(), e.to_string())
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SLACK_WEBHOOK_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        Ok(Self {
            webhook_url: SecretString::from(webhook_url.to_string()),
            username,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;
        let notifications_email = Email::parse(&get_required_env("NOTIFICATIONS_EMAIL")?)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("NOTIFICATIONS_EMAIL".to_string(), e.to_string())
            })?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_validated_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("SMTP_FROM")?,
            notifications_email,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable (empty counts as unset).
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.people.test".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("hunter2-but-long"),
            from_address: "people@people.test".to_string(),
            notifications_email: Email::parse("ops@people.test").unwrap(),
        }
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("changeme123", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_rejects_low_entropy() {
        assert!(validate_secret_strength(&"a".repeat(40), "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(64)), "S").is_ok());
    }

    #[test]
    fn test_slack_config_requires_http_url() {
        assert!(SlackConfig::new("https://hooks.slack.com/services/T/B/x", "PeopleApp".into()).is_ok());
        assert!(SlackConfig::new("webhook_url", "PeopleApp".into()).is_err());
        assert!(SlackConfig::new("ftp://hooks.slack.com/x", "PeopleApp".into()).is_err());
    }

    #[test]
    fn test_slack_config_debug_redacts_webhook() {
        let config =
            SlackConfig::new("https://hooks.slack.com/services/T/B/tok3n", "PeopleApp".into())
                .unwrap();
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("PeopleApp"));
        assert!(!debug_output.contains("tok3n"));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let debug_output = format!("{:?}", email_config());
        assert!(debug_output.contains("smtp.people.test"));
        assert!(debug_output.contains("ops@people.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2-but-long"));
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/people"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://people.test".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            slack: None,
            email: email_config(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.is_secure());
        assert!(config.slack().is_none());
    }
}
