//! Teams Domain
//!
//! Site crews grouped by department, their members and crew leaders.
//! Changes to crews are recorded in the audit log in the same flush as the
//! change itself.
//!
//! Loading a team with [`team_with_includes`] fills the `department`,
//! `team_leader` and `members` navigations; every other read leaves them
//! empty.

pub mod error;
pub mod handlers;
pub mod models;
pub mod specifications;
pub mod visibility;

pub use error::TeamError;
pub use handlers::{AssignTeamLeaderHandler, CreateTeamHandler, GetAllTeamsHandler};
pub use models::{
    AssignTeamLeaderCommand, CreateTeamCommand, Department, GetAllTeamsQuery, Team, TeamDto,
    TeamMember, TeamMemberDto,
};
pub use specifications::{TeamSearch, team_search, team_with_includes};
pub use visibility::{RoleTeamVisibility, TeamVisibility};
