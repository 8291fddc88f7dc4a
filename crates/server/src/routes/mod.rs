//! HTTP route handlers.
//!
//! Every resource answers in HTML or JSON depending on `Accept`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Redirect to /users
//!
//! # Users
//! GET  /users                             - List users
//! GET  /users/new                         - New user form (admin)
//! POST /users                             - Create user (admin), mails operations
//! GET  /users/{id}                        - User with positions
//! GET  /users/{id}/edit                   - Edit form (admin or self)
//! PUT|PATCH|POST /users/{id}              - Update (admin or self)
//!
//! # Teams
//! GET  /teams                             - List teams
//! GET  /teams/new                         - New team form (admin)
//! POST /teams                             - Create team (admin)
//! GET  /teams/{id}                        - Team with members
//! GET  /teams/{id}/edit                   - Edit form (admin)
//! PUT|PATCH|POST /teams/{id}              - Update (admin)
//! DELETE /teams/{id}, POST /teams/{id}/delete - Destroy (admin)
//!
//! # Positions
//! GET  /positions/new?user={id}           - New position form
//! POST /positions                         - Create, mails the user
//! GET  /positions/{id}/edit               - Edit form
//! PUT|PATCH|POST /positions/{id}          - Update
//! DELETE /positions/{id}, POST /positions/{id}/delete - Destroy
//! POST /positions/{id}/toggle-primary     - Flip the primary flag
//!
//! # Projects
//! GET  /projects                          - List projects
//! GET  /projects/new                      - New project form (admin)
//! POST /projects                          - Create (admin)
//! GET  /projects/{id}                     - Project with current members and PM
//! GET  /projects/{id}/edit                - Edit form (admin)
//! PUT|PATCH|POST /projects/{id}           - Update (admin), announces date changes
//! DELETE /projects/{id}, POST /projects/{id}/delete - Destroy (admin)
//! POST /projects/{id}/memberships         - Add member (admin)
//! POST /projects/{id}/memberships/{membership_id}/delete - Remove member (admin)
//!
//! # Roles
//! GET  /roles                             - List roles
//! POST /roles                             - Create role (admin)
//! ```

use axum::{Router, response::Redirect, routing::get};

use crate::state::AppState;

pub mod positions;
pub mod projects;
pub mod respond;
pub mod roles;
pub mod teams;
pub mod users;
pub mod views;

/// Build the application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/users") }))
        .merge(users::router())
        .merge(teams::router())
        .merge(positions::router())
        .merge(projects::router())
        .merge(roles::router())
}
