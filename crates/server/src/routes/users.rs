//! User route handlers.
//!
//! Admins create and edit anyone; everyone may edit their own record but not
//! their admin flag. Creating a user mails the operations address.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use people_core::{RoleId, TeamId, UserId};

use super::respond::{on_failure, on_success, save_errors};
use super::views::{Choice, Layout, choices};
use crate::db::{
    PositionRepository, RepositoryError, RoleRepository, TeamRepository, UserRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::auth::remember;
use crate::middleware::{Payload, RequireUser, ResponseFormat};
use crate::models::{CurrentUser, PositionDetails, User, UserInput, ValidationErrors, user, validation};
use crate::services::email::new_user_mail;
use crate::services::policy::can;
use crate::services::{Action, Resource, authorize};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A user with team and role names resolved.
#[derive(Debug, Clone)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub admin: bool,
    pub team: String,
    pub primary_role: String,
}

/// Id → name lookups for the labels shown next to users.
struct Names {
    teams: HashMap<TeamId, String>,
    roles: HashMap<RoleId, String>,
}

impl Names {
    async fn load(state: &AppState) -> Result<Self, AppError> {
        let teams = TeamRepository::new(state.pool()).list_all().await?;
        let roles = RoleRepository::new(state.pool()).list_all().await?;
        Ok(Self {
            teams: teams.into_iter().map(|t| (t.id, t.name)).collect(),
            roles: roles.into_iter().map(|r| (r.id, r.name)).collect(),
        })
    }

    fn view(&self, user: &User) -> UserView {
        UserView {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            admin: user.admin,
            team: user
                .team_id
                .and_then(|id| self.teams.get(&id).cloned())
                .unwrap_or_default(),
            primary_role: user
                .primary_role_id
                .and_then(|id| self.roles.get(&id).cloned())
                .unwrap_or_default(),
        }
    }
}

/// JSON body of `GET /users/{id}`.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub positions: Vec<PositionDetails>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub layout: Layout,
    pub users: Vec<UserView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub layout: Layout,
    pub user: UserView,
    pub positions: Vec<PositionDetails>,
    pub can_edit: bool,
    pub can_manage_positions: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub cancel_url: String,
    pub input: UserInput,
    pub admin: bool,
    pub errors: ValidationErrors,
    pub teams: Vec<Choice>,
    pub roles: Vec<Choice>,
}

#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(UserId),
}

async fn form_page(
    state: &AppState,
    session: &Session,
    actor: &CurrentUser,
    target: FormTarget,
    input: UserInput,
    errors: ValidationErrors,
) -> Result<UserFormTemplate, AppError> {
    let teams = TeamRepository::new(state.pool()).list_all().await?;
    let roles = RoleRepository::new(state.pool()).list_all().await?;

    let selected_team: Vec<String> = input.team_id.iter().cloned().collect();
    let selected_role: Vec<String> = input.primary_role_id.iter().cloned().collect();
    let (heading, action, cancel_url) = match target {
        FormTarget::New => (
            "New user".to_owned(),
            "/users".to_owned(),
            "/users".to_owned(),
        ),
        FormTarget::Edit(id) => (
            "Edit user".to_owned(),
            format!("/users/{id}"),
            format!("/users/{id}"),
        ),
    };

    Ok(UserFormTemplate {
        layout: Layout::load(session, actor).await,
        heading,
        action,
        cancel_url,
        admin: validation::flag(input.admin.as_ref()),
        teams: choices(teams.into_iter().map(|t| (t.id, t.name)), &selected_team),
        roles: choices(roles.into_iter().map(|r| (r.id, r.name)), &selected_role),
        input,
        errors,
    })
}

async fn find_user(state: &AppState, id: UserId) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

// =============================================================================
// Read Routes
// =============================================================================

/// List users.
#[instrument(skip(actor, state, session))]
pub async fn index(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> Result<Response, AppError> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    if format.is_json() {
        return Ok(Json(users).into_response());
    }

    let names = Names::load(&state).await?;
    Ok(UsersIndexTemplate {
        layout: Layout::load(&session, &actor).await,
        users: users.iter().map(|u| names.view(u)).collect(),
    }
    .into_response())
}

/// Show a user and their positions.
#[instrument(skip(actor, state, session))]
pub async fn show(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<UserId>,
) -> Result<Response, AppError> {
    let user = find_user(&state, id).await?;
    let positions = PositionRepository::new(state.pool())
        .list_for_user(id)
        .await?;

    if format.is_json() {
        return Ok(Json(UserDetails { user, positions }).into_response());
    }

    let names = Names::load(&state).await?;
    Ok(UserShowTemplate {
        layout: Layout::load(&session, &actor).await,
        can_edit: can(&actor, Resource::User { id: Some(id) }, Action::Update),
        can_manage_positions: can(&actor, Resource::Position { owner: id }, Action::Update),
        user: names.view(&user),
        positions,
    }
    .into_response())
}

/// Blank user form.
#[instrument(skip(actor, state, session))]
pub async fn new(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<UserFormTemplate, AppError> {
    authorize(&actor, Resource::User { id: None }, Action::Create)?;
    form_page(
        &state,
        &session,
        &actor,
        FormTarget::New,
        UserInput::default(),
        ValidationErrors::new(),
    )
    .await
}

/// Edit form for a user.
#[instrument(skip(actor, state, session))]
pub async fn edit(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Result<UserFormTemplate, AppError> {
    authorize(&actor, Resource::User { id: Some(id) }, Action::Update)?;
    let user = find_user(&state, id).await?;
    form_page(
        &state,
        &session,
        &actor,
        FormTarget::Edit(id),
        UserInput::from(&user),
        ValidationErrors::new(),
    )
    .await
}

// =============================================================================
// Write Routes
// =============================================================================

/// Create a user and tell operations about it.
#[instrument(skip(actor, state, session, input))]
pub async fn create(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Payload(input): Payload<UserInput>,
) -> Result<Response, AppError> {
    authorize(&actor, Resource::User { id: None }, Action::Create)?;

    let errors = match input.validate() {
        Ok(params) => match UserRepository::new(state.pool()).create(&params).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "User created");
                let config = state.config();
                state.mail().send(new_user_mail(
                    &user,
                    &config.email.notifications_email,
                    &config.base_url,
                ));
                let location = format!("/users/{}", user.id);
                return Ok(on_success(format, &location, StatusCode::CREATED, &user));
            }
            Err(e) => save_errors(e, user::email_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &actor, FormTarget::New, input, errors)
    })
    .await
}

/// Update a user. Only admins may change the admin flag.
#[instrument(skip(actor, state, session, input))]
pub async fn update(
    RequireUser(actor): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<UserId>,
    Payload(input): Payload<UserInput>,
) -> Result<Response, AppError> {
    authorize(&actor, Resource::User { id: Some(id) }, Action::Update)?;
    let existing = find_user(&state, id).await?;

    let errors = match input.validate() {
        Ok(mut params) => {
            if !actor.admin {
                params.admin = existing.admin;
            }
            match UserRepository::new(state.pool()).update(id, &params).await {
                Ok(user) => {
                    info!(user_id = %id, "User updated");
                    if user.id == actor.id {
                        remember(&session, &CurrentUser::from(&user)).await;
                    }
                    let location = format!("/users/{id}");
                    return Ok(on_success(format, &location, StatusCode::ACCEPTED, &user));
                }
                Err(RepositoryError::NotFound) => {
                    return Err(AppError::NotFound(format!("User {id} not found")));
                }
                Err(e) => save_errors(e, user::email_taken)?,
            }
        }
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&state, &session, &actor, FormTarget::Edit(id), input, errors)
    })
    .await
}

// =============================================================================
// Router
// =============================================================================

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index).post(create))
        .route("/users/new", get(new))
        .route(
            "/users/{id}",
            get(show).put(update).patch(update).post(update),
        )
        .route("/users/{id}/edit", get(edit))
}
