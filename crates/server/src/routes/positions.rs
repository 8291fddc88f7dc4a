//! Position route handlers.
//!
//! Admins manage every position; other users manage only their own. Creating
//! a position, or making one primary, mails the position's user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use people_core::{PositionId, UserId};

use super::respond::{back_or, on_failure, on_success, save_errors};
use super::views::{Choice, Layout, choices};
use crate::db::{PositionRepository, RepositoryError, RoleRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Flash, Payload, RequireUser, ResponseFormat, set_flash};
use crate::models::{
    CurrentUser, Position, PositionDetails, PositionInput, ValidationErrors, validation,
};
use crate::services::email::{EmailError, OutgoingMail, new_position_mail, new_primary_mail};
use crate::services::{Action, Resource, authorize};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// `GET /positions/new?user=<id>`
#[derive(Debug, Deserialize)]
pub struct NewPositionQuery {
    pub user: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "positions/form.html")]
pub struct PositionFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub cancel_url: String,
    pub input: PositionInput,
    pub primary: bool,
    pub errors: ValidationErrors,
    pub users: Vec<Choice>,
    pub roles: Vec<Choice>,
}

#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(PositionId),
}

/// Build the form. Non-admins only ever see themselves in the user list.
async fn form_page(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    target: FormTarget,
    input: PositionInput,
    errors: ValidationErrors,
) -> Result<PositionFormTemplate, AppError> {
    let users = if user.admin {
        UserRepository::new(state.pool())
            .list_all()
            .await?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect()
    } else {
        vec![(user.id, user.name.clone())]
    };
    let roles = RoleRepository::new(state.pool()).list_all().await?;

    let selected_user: Vec<String> = input.user_id.iter().cloned().collect();
    let selected_role: Vec<String> = input.role_id.iter().cloned().collect();
    let cancel_url = validation::present(input.user_id.as_ref())
        .map_or_else(|| format!("/users/{}", user.id), |id| format!("/users/{id}"));
    let (heading, action) = match target {
        FormTarget::New => ("New position".to_owned(), "/positions".to_owned()),
        FormTarget::Edit(id) => ("Edit position".to_owned(), format!("/positions/{id}")),
    };

    Ok(PositionFormTemplate {
        layout: Layout::load(session, user).await,
        heading,
        action,
        cancel_url,
        primary: validation::flag(input.primary.as_ref()),
        users: choices(users, &selected_user),
        roles: choices(roles.into_iter().map(|r| (r.id, r.name)), &selected_role),
        input,
        errors,
    })
}

async fn find_position(state: &AppState, id: PositionId) -> Result<Position, AppError> {
    PositionRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Position {id} not found")))
}

/// The user a submitted position is for, falling back to the actor.
fn requested_owner(input: &PositionInput, actor: &CurrentUser) -> UserId {
    input
        .user_id
        .as_deref()
        .and_then(|id| id.parse().ok())
        .unwrap_or(actor.id)
}

fn position_taken() -> ValidationErrors {
    ValidationErrors::single("base", validation::TAKEN)
}

/// Mail the position's user about a new or newly primary position.
async fn queue_position_mail(state: &AppState, position: &Position, actor: &CurrentUser, created: bool) {
    let lookup = PositionRepository::new(state.pool()).details(position.id).await;
    for mail in position_mails(lookup, position, actor, created, &state.config().base_url) {
        state.mail().send(mail);
    }
}

/// Mail owed for a saved position: the new-position mail when it was just
/// created, and the new-primary mail when it is primary.
///
/// The save has already committed, so a failed lookup is reported and sends
/// nothing instead of failing the request.
fn position_mails(
    lookup: Result<Option<PositionDetails>, RepositoryError>,
    position: &Position,
    actor: &CurrentUser,
    created: bool,
    base_url: &str,
) -> Vec<Result<OutgoingMail, EmailError>> {
    let details = match lookup {
        Ok(Some(details)) => details,
        Ok(None) => {
            warn!(position_id = %position.id, "Position vanished before mail was queued");
            return Vec::new();
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            error!(
                position_id = %position.id,
                error = %e,
                sentry_event_id = %event_id,
                "Failed to load position for mail"
            );
            return Vec::new();
        }
    };

    let mut mails = Vec::new();
    if created {
        mails.push(new_position_mail(&details, actor, base_url));
    }
    if details.primary {
        mails.push(new_primary_mail(&details, actor, base_url));
    }
    mails
}

// =============================================================================
// Form Routes
// =============================================================================

/// Blank position form, preselecting `?user=` or the current user.
#[instrument(skip(user, state, session))]
pub async fn new(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NewPositionQuery>,
) -> Result<PositionFormTemplate, AppError> {
    let owner = if user.admin {
        query
            .user
            .as_deref()
            .and_then(|id| id.parse().ok())
            .unwrap_or(user.id)
    } else {
        user.id
    };
    authorize(&user, Resource::Position { owner }, Action::Create)?;

    let input = PositionInput {
        user_id: Some(owner.to_string()),
        ..PositionInput::default()
    };
    form_page(&state, &session, &user, FormTarget::New, input, ValidationErrors::new()).await
}

/// Edit form for an existing position.
#[instrument(skip(user, state, session))]
pub async fn edit(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PositionId>,
) -> Result<PositionFormTemplate, AppError> {
    let position = find_position(&state, id).await?;
    authorize(
        &user,
        Resource::Position {
            owner: position.user_id,
        },
        Action::Update,
    )?;

    form_page(
        &state,
        &session,
        &user,
        FormTarget::Edit(id),
        PositionInput::from(&position),
        ValidationErrors::new(),
    )
    .await
}

// =============================================================================
// Write Routes
// =============================================================================

/// Create a position and mail its user.
#[instrument(skip(user, state, session, input))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Payload(input): Payload<PositionInput>,
) -> Result<Response, AppError> {
    let owner = requested_owner(&input, &user);
    authorize(&user, Resource::Position { owner }, Action::Create)?;

    let errors = match input.validate() {
        Ok(params) => match PositionRepository::new(state.pool()).create(&params).await {
            Ok(position) => {
                info!(
                    position_id = %position.id,
                    user_id = %position.user_id,
                    primary = position.primary,
                    "Position created"
                );
                queue_position_mail(&state, &position, &user, true).await;
                let location = format!("/users/{}", position.user_id);
                return Ok(on_success(format, &location, StatusCode::CREATED, &position));
            }
            Err(e) => save_errors(e, position_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &user, FormTarget::New, input, errors)
    })
    .await
}

/// Update a position. Becoming primary mails the user.
#[instrument(skip(user, state, session, input))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<PositionId>,
    Payload(input): Payload<PositionInput>,
) -> Result<Response, AppError> {
    let before = find_position(&state, id).await?;
    authorize(
        &user,
        Resource::Position {
            owner: before.user_id,
        },
        Action::Update,
    )?;
    let owner = requested_owner(&input, &user);
    if owner != before.user_id {
        authorize(&user, Resource::Position { owner }, Action::Update)?;
    }

    let errors = match input.validate() {
        Ok(params) => match PositionRepository::new(state.pool()).update(id, &params).await {
            Ok(position) => {
                info!(position_id = %id, primary = position.primary, "Position updated");
                if position.primary && !before.primary {
                    queue_position_mail(&state, &position, &user, false).await;
                }
                let location = format!("/users/{}", position.user_id);
                return Ok(on_success(format, &location, StatusCode::ACCEPTED, &position));
            }
            Err(RepositoryError::NotFound) => {
                return Err(AppError::NotFound(format!("Position {id} not found")));
            }
            Err(e) => save_errors(e, position_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &user, FormTarget::Edit(id), input, errors)
    })
    .await
}

/// Delete a position and send the user back where they came from.
#[instrument(skip(user, state, session, headers))]
pub async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    headers: HeaderMap,
    Path(id): Path<PositionId>,
) -> Result<Response, AppError> {
    let position = find_position(&state, id).await?;
    authorize(
        &user,
        Resource::Position {
            owner: position.user_id,
        },
        Action::Destroy,
    )?;

    let deleted = match PositionRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            info!(position_id = %id, "Position deleted");
            true
        }
        Err(e) => {
            warn!(position_id = %id, error = %e, "Failed to delete position");
            false
        }
    };

    if format.is_json() {
        if deleted {
            return Ok(Json(json!({})).into_response());
        }
        return Err(ValidationErrors::single("base", "could not be deleted").into());
    }

    let flash = if deleted {
        Flash::notice("Position deleted successfully.")
    } else {
        Flash::alert("Failed to delete position.")
    };
    set_flash(&session, flash).await;

    let fallback = format!("/users/{}", position.user_id);
    Ok(Redirect::to(&back_or(&headers, &fallback)).into_response())
}

/// Flip a position's primary flag.
///
/// Becoming primary clears the user's other primary positions, sets their
/// primary role and mails them.
#[instrument(skip(user, state))]
pub async fn toggle_primary(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    format: ResponseFormat,
    Path(id): Path<PositionId>,
) -> Result<Response, AppError> {
    let position = find_position(&state, id).await?;
    authorize(
        &user,
        Resource::Position {
            owner: position.user_id,
        },
        Action::TogglePrimary,
    )?;

    let position = PositionRepository::new(state.pool())
        .toggle_primary(id)
        .await?;
    info!(position_id = %id, primary = position.primary, "Position primary flag toggled");

    if position.primary {
        queue_position_mail(&state, &position, &user, false).await;
    }

    let location = format!("/users/{}", position.user_id);
    Ok(on_success(format, &location, StatusCode::OK, &position))
}

// =============================================================================
// Router
// =============================================================================

/// Build the positions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/positions", post(create))
        .route("/positions/new", get(new))
        .route(
            "/positions/{id}",
            put(update)
                .patch(update)
                .post(update)
                .delete(destroy),
        )
        .route("/positions/{id}/edit", get(edit))
        .route("/positions/{id}/delete", post(destroy))
        .route("/positions/{id}/toggle-primary", post(toggle_primary))
}
