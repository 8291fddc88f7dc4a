//! One-shot flash messages kept in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

use crate::models::session::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Notice,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Notice,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Alert,
            message: message.into(),
        }
    }

    /// CSS class for the banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Notice => "flash-notice",
            FlashKind::Alert => "flash-alert",
        }
    }
}

/// Store a flash for the next page view.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(keys::FLASH, flash).await {
        warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending flash, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session.remove::<Flash>(keys::FLASH).await.ok().flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_serializes_kind_lowercase() {
        let json = serde_json::to_value(Flash::alert("Failed to delete position.")).unwrap();
        assert_eq!(json["kind"], "alert");
        assert_eq!(Flash::notice("ok").css_class(), "flash-notice");
    }
}
