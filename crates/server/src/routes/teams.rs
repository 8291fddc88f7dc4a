//! Team route handlers.
//!
//! Anyone signed in can list and view teams; changes are admin only.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use people_core::{TeamId, UserId};

use super::respond::{on_failure, on_success, save_errors};
use super::views::{Choice, Layout, choices};
use crate::db::{RepositoryError, TeamRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Flash, Payload, RequireUser, ResponseFormat, set_flash};
use crate::models::{CurrentUser, TeamInput, TeamWithMembers, User, ValidationErrors, team};
use crate::services::{Action, Resource, authorize};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// One row of the team list.
#[derive(Debug, Clone)]
pub struct TeamRow {
    pub id: TeamId,
    pub name: String,
    pub leader: String,
    pub member_count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "teams/index.html")]
pub struct TeamsIndexTemplate {
    pub layout: Layout,
    pub teams: Vec<TeamRow>,
}

#[derive(Template, WebTemplate)]
#[template(path = "teams/show.html")]
pub struct TeamShowTemplate {
    pub layout: Layout,
    pub team: TeamRow,
    pub leader: String,
    pub members: Vec<User>,
}

#[derive(Template, WebTemplate)]
#[template(path = "teams/form.html")]
pub struct TeamFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub input: TeamInput,
    pub errors: ValidationErrors,
    pub leaders: Vec<Choice>,
    pub members: Vec<Choice>,
}

/// Which form is being shown.
#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(TeamId),
}

async fn form_page(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    target: FormTarget,
    input: TeamInput,
    errors: ValidationErrors,
) -> Result<TeamFormTemplate, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    let pairs = || users.iter().map(|u| (u.id, u.name.clone()));

    let leader_selected: Vec<String> = input.team_leader_id.iter().cloned().collect();
    let (heading, action) = match target {
        FormTarget::New => ("New team".to_owned(), "/teams".to_owned()),
        FormTarget::Edit(id) => ("Edit team".to_owned(), format!("/teams/{id}")),
    };

    Ok(TeamFormTemplate {
        layout: Layout::load(session, user).await,
        heading,
        action,
        leaders: choices(pairs(), &leader_selected),
        members: choices(pairs(), input.user_ids.as_deref().unwrap_or_default()),
        input,
        errors,
    })
}

fn names_by_id(users: &[User]) -> HashMap<UserId, &str> {
    users.iter().map(|u| (u.id, u.name.as_str())).collect()
}

async fn find_team(state: &AppState, id: TeamId) -> Result<TeamWithMembers, AppError> {
    TeamRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {id} not found")))
}

// =============================================================================
// Read Routes
// =============================================================================

/// List teams.
#[instrument(skip(user, state, session))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> Result<Response, AppError> {
    let teams = TeamRepository::new(state.pool()).list_all().await?;
    if format.is_json() {
        return Ok(Json(teams).into_response());
    }

    let users = UserRepository::new(state.pool()).list_all().await?;
    let names = names_by_id(&users);
    let rows = teams
        .iter()
        .map(|t| TeamRow {
            id: t.id,
            name: t.name.clone(),
            leader: t
                .team_leader_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or_default()
                .to_owned(),
            member_count: users.iter().filter(|u| u.team_id == Some(t.id)).count(),
        })
        .collect();

    Ok(TeamsIndexTemplate {
        layout: Layout::load(&session, &user).await,
        teams: rows,
    }
    .into_response())
}

/// Show one team with its members.
#[instrument(skip(user, state, session))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<TeamId>,
) -> Result<Response, AppError> {
    let team = find_team(&state, id).await?;
    if format.is_json() {
        return Ok(Json(team).into_response());
    }

    let users = UserRepository::new(state.pool());
    let members = users.list_by_team(id).await?;
    let leader = match team.team.team_leader_id {
        Some(leader_id) => users
            .get_by_id(leader_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default(),
        None => String::new(),
    };

    Ok(TeamShowTemplate {
        layout: Layout::load(&session, &user).await,
        team: TeamRow {
            id: team.team.id,
            name: team.team.name,
            leader: leader.clone(),
            member_count: members.len(),
        },
        leader,
        members,
    }
    .into_response())
}

/// Blank team form.
#[instrument(skip(user, state, session))]
pub async fn new(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<TeamFormTemplate, AppError> {
    authorize(&user, Resource::Team, Action::Create)?;
    form_page(
        &state,
        &session,
        &user,
        FormTarget::New,
        TeamInput::default(),
        ValidationErrors::new(),
    )
    .await
}

/// Edit form for an existing team.
#[instrument(skip(user, state, session))]
pub async fn edit(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<TeamId>,
) -> Result<TeamFormTemplate, AppError> {
    authorize(&user, Resource::Team, Action::Update)?;
    let team = find_team(&state, id).await?;
    form_page(
        &state,
        &session,
        &user,
        FormTarget::Edit(id),
        TeamInput::from(&team),
        ValidationErrors::new(),
    )
    .await
}

// =============================================================================
// Write Routes
// =============================================================================

/// Create a team.
#[instrument(skip(user, state, session, input))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Payload(input): Payload<TeamInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Team, Action::Create)?;

    let errors = match input.validate() {
        Ok(params) => match TeamRepository::new(state.pool()).create(&params).await {
            Ok(team) => {
                info!(team_id = %team.team.id, name = %team.team.name, "Team created");
                return Ok(on_success(format, "/teams", StatusCode::CREATED, &json!({})));
            }
            Err(e) => save_errors(e, team::name_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &user, FormTarget::New, input, errors)
    })
    .await
}

/// Update a team's name, leader and members. Attributes left out of the
/// request keep their stored values.
#[instrument(skip(user, state, session, input))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<TeamId>,
    Payload(input): Payload<TeamInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Team, Action::Update)?;
    let input = input.or_current(&find_team(&state, id).await?);

    let errors = match input.validate() {
        Ok(params) => match TeamRepository::new(state.pool()).update(id, &params).await {
            Ok(team) => {
                info!(team_id = %id, "Team updated");
                return Ok(on_success(format, "/teams", StatusCode::ACCEPTED, &team));
            }
            Err(RepositoryError::NotFound) => {
                return Err(AppError::NotFound(format!("Team {id} not found")));
            }
            Err(e) => save_errors(e, team::name_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &user, FormTarget::Edit(id), input, errors)
    })
    .await
}

/// Delete a team. Its members are left without a team.
#[instrument(skip(user, state, session))]
pub async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<TeamId>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Team, Action::Destroy)?;

    match TeamRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            info!(team_id = %id, "Team deleted");
            Ok(on_success(format, "/teams", StatusCode::OK, &json!({})))
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("Team {id} not found"))),
        Err(e @ (RepositoryError::Conflict(_) | RepositoryError::InvalidReference(_))) => {
            warn!(team_id = %id, error = %e, "Team could not be deleted");
            if format.is_json() {
                return Err(ValidationErrors::single("base", "could not be deleted").into());
            }
            set_flash(&session, Flash::alert("Failed to delete team.")).await;
            Ok(on_success(format, "/teams", StatusCode::OK, &json!({})))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the teams router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/teams", get(index).post(create))
        .route("/teams/new", get(new))
        .route(
            "/teams/{id}",
            get(show)
                .put(update)
                .patch(update)
                .post(update)
                .delete(destroy),
        )
        .route("/teams/{id}/edit", get(edit))
        .route("/teams/{id}/delete", post(destroy))
}
