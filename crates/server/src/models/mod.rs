//! Domain models: database rows, request input and validation.

pub mod membership;
pub mod position;
pub mod project;
pub mod role;
pub mod session;
pub mod team;
pub mod user;
pub mod validation;

pub use membership::{Membership, MembershipInput, MembershipParams, project_manager};
pub use position::{Position, PositionDetails, PositionInput, PositionParams};
pub use project::{Project, ProjectInput, ProjectParams};
pub use role::{Role, RoleInput};
pub use session::CurrentUser;
pub use team::{Team, TeamInput, TeamParams, TeamWithMembers};
pub use user::{User, UserInput, UserParams};
pub use validation::ValidationErrors;
