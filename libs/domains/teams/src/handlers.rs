use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use core_config::paging::PagingConfig;
use database::{CancellationToken, Store, UnitOfWork};
use domain_audit_logs::{AuditAction, AuditLog};
use mediator::{CurrentUser, Outcome, PageRequest, PaginatedResponse, RequestHandler};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::TeamError;
use crate::models::{
    AssignTeamLeaderCommand, CreateTeamCommand, Department, GetAllTeamsQuery, Team, TeamDto,
    TeamMember,
};
use crate::specifications::{TeamSearch, team_search, team_with_includes};
use crate::visibility::TeamVisibility;

const TEAM_TABLE: &str = "Team";

pub struct CreateTeamHandler {
    store: Store,
    current_user: Arc<dyn CurrentUser>,
}

impl CreateTeamHandler {
    pub fn new(store: Store, current_user: Arc<dyn CurrentUser>) -> Self {
        Self { store, current_user }
    }
}

#[async_trait]
impl RequestHandler<CreateTeamCommand> for CreateTeamHandler {
    #[instrument(skip_all, fields(team_code = %request.team_code))]
    async fn handle(
        &self,
        request: CreateTeamCommand,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<TeamDto>> {
        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let teams = uow.repository::<Team>();

        let code = request.team_code.clone();
        if teams.is_exist(|t| t.team_code == code).await? {
            return Ok(Outcome::failure(TeamError::DuplicateCode));
        }

        if uow
            .repository::<Department>()
            .get_by_id(&request.department_code)
            .await?
            .is_none()
        {
            return Ok(Outcome::failure(TeamError::DepartmentNotFound));
        }

        let changed_by = self.current_user.user_id();
        let team = teams
            .add(Team {
                team_id: Uuid::new_v4(),
                team_code: request.team_code,
                team_name: request.team_name,
                department_code: request.department_code,
                trade: request.trade,
                is_active: true,
                team_leader_member_id: None,
                created_by: changed_by,
                created_date: Utc::now(),
                department: None,
                team_leader: None,
                members: Vec::new(),
            })
            .await?;

        let snapshot = serde_json::json!({
            "TeamCode": team.team_code,
            "TeamName": team.team_name,
            "DepartmentCode": team.department_code,
            "Trade": team.trade,
        });
        let audit = AuditLog::new(TEAM_TABLE, team.team_id, AuditAction::Creation)
            .with_values("N/A (New Entity)", snapshot.to_string())
            .changed_by(changed_by)
            .with_description(format!(
                "New Team '{} - {}' created successfully.",
                team.team_code, team.team_name
            ));
        uow.repository::<AuditLog>().add(audit).await?;

        uow.complete().await?;
        info!(team_id = %team.team_id, "Team created");

        let created = teams.get_entity_with_spec(&team_with_includes(team.team_id)).await?;
        Ok(Outcome::create(created.map(TeamDto::from)))
    }
}

pub struct AssignTeamLeaderHandler {
    store: Store,
    current_user: Arc<dyn CurrentUser>,
    visibility: Arc<dyn TeamVisibility>,
}

impl AssignTeamLeaderHandler {
    pub fn new(
        store: Store,
        current_user: Arc<dyn CurrentUser>,
        visibility: Arc<dyn TeamVisibility>,
    ) -> Self {
        Self {
            store,
            current_user,
            visibility,
        }
    }
}

#[async_trait]
impl RequestHandler<AssignTeamLeaderCommand> for AssignTeamLeaderHandler {
    #[instrument(skip_all, fields(team_id = %request.team_id, team_member_id = %request.team_member_id))]
    async fn handle(
        &self,
        request: AssignTeamLeaderCommand,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<TeamDto>> {
        if !self.visibility.can_manage_members().await? {
            return Ok(Outcome::failure(TeamError::AccessDenied));
        }

        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let teams = uow.repository::<Team>();

        let Some(mut team) = teams
            .get_entity_with_spec(&team_with_includes(request.team_id))
            .await?
        else {
            return Ok(Outcome::failure(TeamError::TeamNotFound));
        };

        let Some(member) = uow
            .repository::<TeamMember>()
            .get_by_id(&request.team_member_id)
            .await?
        else {
            return Ok(Outcome::failure(TeamError::MemberNotFound));
        };

        if member.team_id != team.team_id {
            return Ok(Outcome::failure(TeamError::MemberOfAnotherTeam));
        }

        if !member.is_active {
            return Ok(Outcome::failure(TeamError::InactiveMember));
        }

        let old_leader = team
            .team_leader_member_id
            .map_or_else(|| "null".to_string(), |id| id.to_string());

        team.team_leader_member_id = Some(member.team_member_id);
        teams.update(team.detached())?;

        let audit = AuditLog::new(TEAM_TABLE, team.team_id, AuditAction::Update)
            .with_values(
                format!("Crew LeaderId: {}", old_leader),
                format!("Crew LeaderId: {}", member.team_member_id),
            )
            .changed_by(self.current_user.user_id())
            .with_description(format!(
                "Crew leader {} assigned to Crew {} ({})",
                member.employee_name, team.team_code, team.team_name
            ));
        uow.repository::<AuditLog>().add(audit).await?;

        uow.complete().await?;
        info!("Crew leader assigned");

        team.team_leader = Some(member);
        Ok(Outcome::success(TeamDto::from(team)))
    }
}

pub struct GetAllTeamsHandler {
    store: Store,
    visibility: Arc<dyn TeamVisibility>,
    paging: PagingConfig,
}

impl GetAllTeamsHandler {
    pub fn new(store: Store, visibility: Arc<dyn TeamVisibility>, paging: PagingConfig) -> Self {
        Self {
            store,
            visibility,
            paging,
        }
    }
}

#[async_trait]
impl RequestHandler<GetAllTeamsQuery> for GetAllTeamsHandler {
    #[instrument(skip_all, fields(page = request.page, search = ?request.search))]
    async fn handle(
        &self,
        request: GetAllTeamsQuery,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<PaginatedResponse<TeamDto>>> {
        let accessible_team_ids = self
            .visibility
            .accessible_team_ids(cancellation.clone())
            .await?;
        let page = PageRequest::new(request.page, request.page_size).normalize(&self.paging);

        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        let departments = uow.repository::<Department>().get_all().await?;

        let department_codes = request
            .department
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                departments
                    .iter()
                    .filter(|d| d.department_name == name)
                    .map(|d| d.department_code.clone())
                    .collect()
            });

        let term = request
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let (search_department_codes, search_leader_ids) = match &term {
            Some(term) => {
                let codes = departments
                    .iter()
                    .filter(|d| d.department_name.to_lowercase().contains(term))
                    .map(|d| d.department_code.clone())
                    .collect();
                let leaders = uow
                    .repository::<TeamMember>()
                    .get_all()
                    .await?
                    .into_iter()
                    .filter(|m| m.employee_name.to_lowercase().contains(term))
                    .map(|m| m.team_member_id)
                    .collect();
                (codes, leaders)
            }
            None => (Vec::new(), Vec::new()),
        };

        let filter = TeamSearch {
            search: term,
            trade: request.trade,
            is_active: request.is_active,
            accessible_team_ids,
            department_codes,
            search_department_codes,
            search_leader_ids,
        };
        let spec = team_search(filter, page.page_size, page.page);

        let (teams, total_count) = uow.repository::<Team>().get_with_spec(&spec).await?;
        let items = teams.into_iter().map(TeamDto::from).collect();

        Ok(Outcome::success(PaginatedResponse::new(
            items,
            total_count,
            page.page,
            page.page_size,
        )))
    }
}
