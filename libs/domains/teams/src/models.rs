use chrono::{DateTime, Utc};
use database::{DatabaseError, DatabaseResult, Entity, Related};
use mediator::{PaginatedResponse, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const INCLUDE_DEPARTMENT: &str = "Department";
pub const INCLUDE_TEAM_LEADER: &str = "TeamLeader";
pub const INCLUDE_MEMBERS: &str = "Members";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_code: String,
    pub department_name: String,
}

impl Entity for Department {
    type Key = String;
    const NAME: &'static str = "Department";

    fn key(&self) -> String {
        self.department_code.clone()
    }
}

/// A worker on a crew
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_member_id: Uuid,
    pub team_id: Uuid,
    /// Login of the worker, when they have one
    pub user_id: Option<Uuid>,
    pub employee_code: String,
    pub employee_name: String,
    pub is_active: bool,
}

impl Entity for TeamMember {
    type Key = Uuid;
    const NAME: &'static str = "TeamMember";

    fn key(&self) -> Uuid {
        self.team_member_id
    }
}

/// A site crew.
///
/// `department`, `team_leader` and `members` stay empty until loaded
/// through the matching include path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: Uuid,
    pub team_code: String,
    pub team_name: String,
    pub department_code: String,
    pub trade: Option<String>,
    pub is_active: bool,
    pub team_leader_member_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub team_leader: Option<TeamMember>,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl Team {
    /// Copy without loaded navigations, for writing back to the store
    pub fn detached(&self) -> Self {
        Self {
            department: None,
            team_leader: None,
            members: Vec::new(),
            ..self.clone()
        }
    }
}

impl Entity for Team {
    type Key = Uuid;
    const NAME: &'static str = "Team";

    fn key(&self) -> Uuid {
        self.team_id
    }

    fn load_navigation(&mut self, path: &str, related: &Related<'_>) -> DatabaseResult<()> {
        match path {
            INCLUDE_DEPARTMENT => {
                self.department = related.find::<Department>(&self.department_code)?;
            }
            INCLUDE_TEAM_LEADER => {
                self.team_leader = match self.team_leader_member_id {
                    Some(member_id) => related.find::<TeamMember>(&member_id)?,
                    None => None,
                };
            }
            INCLUDE_MEMBERS => {
                let team_id = self.team_id;
                self.members = related.filter(|member: &TeamMember| member.team_id == team_id)?;
            }
            other => {
                return Err(DatabaseError::UnknownNavigation {
                    entity: Self::NAME,
                    path: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDto {
    pub team_member_id: Uuid,
    pub employee_code: String,
    pub employee_name: String,
    pub is_active: bool,
}

impl From<TeamMember> for TeamMemberDto {
    fn from(member: TeamMember) -> Self {
        Self {
            team_member_id: member.team_member_id,
            employee_code: member.employee_code,
            employee_name: member.employee_name,
            is_active: member.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    pub team_id: Uuid,
    pub team_code: String,
    pub team_name: String,
    pub department_code: String,
    pub department_name: Option<String>,
    pub trade: Option<String>,
    pub is_active: bool,
    pub team_leader_member_id: Option<Uuid>,
    pub team_leader_name: Option<String>,
    pub team_size: usize,
    pub members: Vec<TeamMemberDto>,
    pub created_date: DateTime<Utc>,
}

impl From<Team> for TeamDto {
    fn from(team: Team) -> Self {
        Self {
            team_id: team.team_id,
            team_code: team.team_code,
            team_name: team.team_name,
            department_code: team.department_code,
            department_name: team.department.map(|d| d.department_name),
            trade: team.trade,
            is_active: team.is_active,
            team_leader_member_id: team.team_leader_member_id,
            team_leader_name: team.team_leader.map(|m| m.employee_name),
            team_size: team.members.iter().filter(|m| m.is_active).count(),
            members: team.members.into_iter().map(TeamMemberDto::from).collect(),
            created_date: team.created_date,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTeamCommand {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub team_code: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub team_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub department_code: String,
    #[validate(length(max = 100, message = "must not exceed 100 characters"))]
    pub trade: Option<String>,
}

impl Request for CreateTeamCommand {
    type Response = TeamDto;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AssignTeamLeaderCommand {
    pub team_id: Uuid,
    pub team_member_id: Uuid,
}

impl Request for AssignTeamLeaderCommand {
    type Response = TeamDto;
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GetAllTeamsQuery {
    #[validate(length(max = 100))]
    pub search: Option<String>,
    /// Department name, matched exactly
    pub department: Option<String>,
    pub trade: Option<String>,
    pub is_active: Option<bool>,
    pub page: u32,
    pub page_size: u32,
}

impl Request for GetAllTeamsQuery {
    type Response = PaginatedResponse<TeamDto>;
}
