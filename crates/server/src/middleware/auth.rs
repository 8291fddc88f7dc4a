//! Authentication extractor.
//!
//! The server runs behind an authenticating proxy that forwards the signed-in
//! person's email in a trusted header (`x-forwarded-email` by default). The
//! email is resolved to a `users` row once and cached in the session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{debug, error, warn};

use people_core::Email;

use crate::db::UserRepository;
use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session::keys};
use crate::state::AppState;

/// Extractor that requires a known user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Error returned when the request cannot be tied to a user.
#[derive(Debug)]
pub enum AuthRejection {
    /// No proxy header, or no user with that email.
    Unauthorized,
    /// Session or database failure.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "You need to be signed in to access this page",
            )
                .into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Email forwarded by the auth proxy in `header`.
fn forwarded_email(parts: &Parts, header: &str) -> Option<Email> {
    let value = parts.headers.get(header)?.to_str().ok()?;
    Email::parse(value).ok()
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Internal)?;

        let Some(email) = forwarded_email(parts, &state.config().auth_header) else {
            debug!("Request without a forwarded email");
            return Err(AuthRejection::Unauthorized);
        };

        let cached: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();
        if let Some(user) = cached.filter(|user| user.email == email) {
            set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
            return Ok(Self(user));
        }

        let user = UserRepository::new(state.pool())
            .get_by_email(&email)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up signed-in user");
                AuthRejection::Internal
            })?
            .ok_or_else(|| {
                warn!(email = %email, "Forwarded email has no user");
                AuthRejection::Unauthorized
            })?;

        let user = CurrentUser::from(&user);
        remember(&session, &user).await;
        set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Cache the signed-in user in the session.
pub async fn remember(session: &Session, user: &CurrentUser) {
    if let Err(e) = session.insert(keys::CURRENT_USER, user).await {
        warn!(error = %e, "Failed to cache user in session");
    }
}
