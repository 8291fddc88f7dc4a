//! Project route handlers, including nested memberships.
//!
//! Updating a project posts to Slack when any of its tracked dates changed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::{info, instrument};

use people_core::{MembershipId, ProjectId, UserId, initials, random_color};

use super::respond::{on_failure, on_success, save_errors};
use super::views::{Choice, Layout, choices, ymd};
use crate::db::{
    MembershipRepository, ProjectRepository, RepositoryError, RoleRepository, UserRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Payload, RequireUser, ResponseFormat};
use crate::models::{
    CurrentUser, Membership, MembershipInput, Project, ProjectInput, ValidationErrors, project,
    project_manager, validation,
};
use crate::services::{Action, Resource, authorize, notify_project_update};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A project with its dates formatted for display.
#[derive(Debug, Clone)]
pub struct ProjectView {
    pub id: ProjectId,
    pub name: String,
    pub initials: String,
    pub color: String,
    pub kickoff: String,
    pub starts_at: String,
    pub end_at: String,
}

impl From<&Project> for ProjectView {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            initials: project.initials.clone(),
            color: project.color.clone(),
            kickoff: ymd(project.kickoff),
            starts_at: ymd(project.starts_at),
            end_at: ymd(project.end_at),
        }
    }
}

/// A membership row on the project page.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub id: MembershipId,
    pub user_id: UserId,
    pub user_name: String,
    pub role_name: String,
    pub starts_at: String,
    pub ends_at: String,
}

impl From<&Membership> for MemberView {
    fn from(m: &Membership) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            user_name: m.user_name.clone(),
            role_name: m.role_name.clone(),
            starts_at: ymd(Some(m.starts_at.date_naive())),
            ends_at: ymd(m.ends_at.map(|d| d.date_naive())),
        }
    }
}

/// JSON body of `GET /projects/{id}`.
#[derive(Debug, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub memberships: Vec<Membership>,
    pub project_manager_id: Option<UserId>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "projects/index.html")]
pub struct ProjectsIndexTemplate {
    pub layout: Layout,
    pub projects: Vec<ProjectView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "projects/show.html")]
pub struct ProjectShowTemplate {
    pub layout: Layout,
    pub project: ProjectView,
    pub project_manager: String,
    pub members: Vec<MemberView>,
    pub membership: MembershipInput,
    pub errors: ValidationErrors,
    pub users: Vec<Choice>,
    pub roles: Vec<Choice>,
}

#[derive(Template, WebTemplate)]
#[template(path = "projects/form.html")]
pub struct ProjectFormTemplate {
    pub layout: Layout,
    pub heading: String,
    pub action: String,
    pub cancel_url: String,
    pub input: ProjectInput,
    pub errors: ValidationErrors,
}

#[derive(Debug, Clone, Copy)]
enum FormTarget {
    New,
    Edit(ProjectId),
}

async fn form_page(
    session: &Session,
    user: &CurrentUser,
    target: FormTarget,
    input: ProjectInput,
    errors: ValidationErrors,
) -> Result<ProjectFormTemplate, AppError> {
    let (heading, action, cancel_url) = match target {
        FormTarget::New => (
            "New project".to_owned(),
            "/projects".to_owned(),
            "/projects".to_owned(),
        ),
        FormTarget::Edit(id) => (
            "Edit project".to_owned(),
            format!("/projects/{id}"),
            format!("/projects/{id}"),
        ),
    };

    Ok(ProjectFormTemplate {
        layout: Layout::load(session, user).await,
        heading,
        action,
        cancel_url,
        input,
        errors,
    })
}

/// The project page, with the add-member form pre-filled from `membership`.
async fn show_page(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    project: &Project,
    membership: MembershipInput,
    errors: ValidationErrors,
) -> Result<ProjectShowTemplate, AppError> {
    let memberships = MembershipRepository::new(state.pool())
        .list_for_project(project.id)
        .await?;
    let users = UserRepository::new(state.pool()).list_all().await?;
    let roles = RoleRepository::new(state.pool()).list_all().await?;

    let now = Utc::now();
    let project_manager = project_manager(&memberships, now)
        .map(|m| m.user_name.clone())
        .unwrap_or_default();
    let members = memberships
        .iter()
        .filter(|m| m.is_current_at(now))
        .map(MemberView::from)
        .collect();

    let selected_user: Vec<String> = membership.user_id.iter().cloned().collect();
    let selected_role: Vec<String> = membership.role_id.iter().cloned().collect();

    Ok(ProjectShowTemplate {
        layout: Layout::load(session, user).await,
        project: ProjectView::from(project),
        project_manager,
        members,
        users: choices(users.into_iter().map(|u| (u.id, u.name)), &selected_user),
        roles: choices(roles.into_iter().map(|r| (r.id, r.name)), &selected_role),
        membership,
        errors,
    })
}

async fn find_project(state: &AppState, id: ProjectId) -> Result<Project, AppError> {
    ProjectRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
}

fn membership_conflict() -> ValidationErrors {
    ValidationErrors::single("base", validation::TAKEN)
}

// =============================================================================
// Read Routes
// =============================================================================

/// List projects.
#[instrument(skip(user, state, session))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> Result<Response, AppError> {
    let projects = ProjectRepository::new(state.pool()).list_all().await?;
    if format.is_json() {
        return Ok(Json(projects).into_response());
    }

    Ok(ProjectsIndexTemplate {
        layout: Layout::load(&session, &user).await,
        projects: projects.iter().map(ProjectView::from).collect(),
    }
    .into_response())
}

/// Show a project with its current members and project manager.
#[instrument(skip(user, state, session))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<ProjectId>,
) -> Result<Response, AppError> {
    let project = find_project(&state, id).await?;

    if format.is_json() {
        let memberships = MembershipRepository::new(state.pool())
            .list_for_project(id)
            .await?;
        let project_manager_id = project_manager(&memberships, Utc::now()).map(|m| m.user_id);
        return Ok(Json(ProjectDetails {
            project,
            memberships,
            project_manager_id,
        })
        .into_response());
    }

    let page = show_page(
        &state,
        &session,
        &user,
        &project,
        MembershipInput::default(),
        ValidationErrors::new(),
    )
    .await?;
    Ok(page.into_response())
}

/// Blank project form.
#[instrument(skip(user, session))]
pub async fn new(
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<ProjectFormTemplate, AppError> {
    authorize(&user, Resource::Project, Action::Create)?;
    form_page(
        &session,
        &user,
        FormTarget::New,
        ProjectInput::default(),
        ValidationErrors::new(),
    )
    .await
}

/// Edit form for an existing project.
#[instrument(skip(user, state, session))]
pub async fn edit(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProjectId>,
) -> Result<ProjectFormTemplate, AppError> {
    authorize(&user, Resource::Project, Action::Update)?;
    let project = find_project(&state, id).await?;
    form_page(
        &session,
        &user,
        FormTarget::Edit(id),
        ProjectInput::from(&project),
        ValidationErrors::new(),
    )
    .await
}

// =============================================================================
// Write Routes
// =============================================================================

/// Create a project. Initials and color are derived once, here.
#[instrument(skip(user, state, session, input))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Payload(input): Payload<ProjectInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Project, Action::Create)?;
    let projects = ProjectRepository::new(state.pool());

    let errors = match input.validate() {
        Ok(params) => {
            if projects.name_taken(&params.name, None).await? {
                project::name_taken()
            } else {
                let initials = initials(&params.name);
                let color = random_color(&mut rand::rng());
                match projects.create(&params, &initials, &color).await {
                    Ok(project) => {
                        info!(project_id = %project.id, name = %project.name, "Project created");
                        let location = format!("/projects/{}", project.id);
                        return Ok(on_success(format, &location, StatusCode::CREATED, &project));
                    }
                    Err(e) => save_errors(e, project::name_taken)?,
                }
            }
        }
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&session, &user, FormTarget::New, input, errors)
    })
    .await
}

/// Update a project, then announce any date changes.
///
/// Attributes left out of the request keep their stored values.
#[instrument(skip(user, state, session, input))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<ProjectId>,
    Payload(input): Payload<ProjectInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Project, Action::Update)?;
    let input = input.or_current(&find_project(&state, id).await?);
    let projects = ProjectRepository::new(state.pool());

    let errors = match input.validate() {
        Ok(params) => {
            if projects.name_taken(&params.name, Some(id)).await? {
                project::name_taken()
            } else {
                match projects.update(id, &params).await {
                    Ok((before, after)) => {
                        info!(project_id = %id, "Project updated");
                        notify_project_update(
                            state.slack(),
                            &after.name,
                            &before.dates(),
                            &after.dates(),
                        )
                        .await;
                        let location = format!("/projects/{id}");
                        return Ok(on_success(format, &location, StatusCode::ACCEPTED, &after));
                    }
                    Err(RepositoryError::NotFound) => {
                        return Err(AppError::NotFound(format!("Project {id} not found")));
                    }
                    Err(e) => save_errors(e, project::name_taken)?,
                }
            }
        }
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        form_page(&session, &user, FormTarget::Edit(id), input, errors)
    })
    .await
}

/// Delete a project and its memberships.
#[instrument(skip(user, state))]
pub async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    format: ResponseFormat,
    Path(id): Path<ProjectId>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Project, Action::Destroy)?;

    match ProjectRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            info!(project_id = %id, "Project deleted");
            Ok(on_success(format, "/projects", StatusCode::OK, &json!({})))
        }
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("Project {id} not found")))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Membership Routes
// =============================================================================

/// Add someone to a project.
#[instrument(skip(user, state, session, input))]
pub async fn create_membership(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(id): Path<ProjectId>,
    Payload(input): Payload<MembershipInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Project, Action::Update)?;
    let project = find_project(&state, id).await?;

    let errors = match input.validate() {
        Ok(params) => match MembershipRepository::new(state.pool())
            .create(id, &params)
            .await
        {
            Ok(membership_id) => {
                info!(project_id = %id, membership_id = %membership_id, "Membership created");
                let location = format!("/projects/{id}");
                return Ok(on_success(
                    format,
                    &location,
                    StatusCode::CREATED,
                    &json!({ "id": membership_id }),
                ));
            }
            Err(e) => save_errors(e, membership_conflict)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        show_page(&state, &session, &user, &project, input, errors)
    })
    .await
}

/// Remove someone from a project.
#[instrument(skip(user, state))]
pub async fn destroy_membership(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    format: ResponseFormat,
    Path((id, membership_id)): Path<(ProjectId, MembershipId)>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Project, Action::Update)?;

    match MembershipRepository::new(state.pool())
        .delete(id, membership_id)
        .await
    {
        Ok(()) => {
            info!(project_id = %id, membership_id = %membership_id, "Membership deleted");
            let location = format!("/projects/{id}");
            Ok(on_success(format, &location, StatusCode::OK, &json!({})))
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!(
            "Membership {membership_id} not found"
        ))),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Build the projects router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(index).post(create))
        .route("/projects/new", get(new))
        .route(
            "/projects/{id}",
            get(show)
                .put(update)
                .patch(update)
                .post(update)
                .delete(destroy),
        )
        .route("/projects/{id}/edit", get(edit))
        .route("/projects/{id}/delete", post(destroy))
        .route("/projects/{id}/memberships", post(create_membership))
        .route(
            "/projects/{id}/memberships/{membership_id}/delete",
            post(destroy_membership),
        )
}
