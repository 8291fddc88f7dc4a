//! Role route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::respond::{on_failure, on_success, save_errors};
use super::views::Layout;
use crate::db::RoleRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{Payload, RequireUser, ResponseFormat};
use crate::models::{CurrentUser, Role, RoleInput, ValidationErrors, role};
use crate::services::{Action, Resource, authorize};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "roles/index.html")]
pub struct RolesIndexTemplate {
    pub layout: Layout,
    pub roles: Vec<Role>,
    pub input: RoleInput,
    pub errors: ValidationErrors,
}

async fn index_page(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    input: RoleInput,
    errors: ValidationErrors,
) -> Result<RolesIndexTemplate, AppError> {
    Ok(RolesIndexTemplate {
        layout: Layout::load(session, user).await,
        roles: RoleRepository::new(state.pool()).list_all().await?,
        input,
        errors,
    })
}

/// List roles, with the new-role form for admins.
#[instrument(skip(user, state, session))]
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> Result<Response, AppError> {
    if format.is_json() {
        let roles = RoleRepository::new(state.pool()).list_all().await?;
        return Ok(Json(roles).into_response());
    }

    let page = index_page(
        &state,
        &session,
        &user,
        RoleInput::default(),
        ValidationErrors::new(),
    )
    .await?;
    Ok(page.into_response())
}

/// Create a role.
#[instrument(skip(user, state, session, input))]
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Payload(input): Payload<RoleInput>,
) -> Result<Response, AppError> {
    authorize(&user, Resource::Role, Action::Create)?;

    let errors = match input.validate() {
        Ok(name) => match RoleRepository::new(state.pool()).create(&name).await {
            Ok(role) => {
                info!(role_id = %role.id, name = %role.name, "Role created");
                return Ok(on_success(format, "/roles", StatusCode::CREATED, &role));
            }
            Err(e) => save_errors(e, role::name_taken)?,
        },
        Err(errors) => errors,
    };

    on_failure(format, errors, |errors| {
        index_page(&state, &session, &user, input, errors)
    })
    .await
}

/// Build the roles router.
pub fn router() -> Router<AppState> {
    Router::new().route("/roles", get(index).post(create))
}
