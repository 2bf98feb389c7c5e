//! Which crews the caller may see and manage.

use std::sync::Arc;

use async_trait::async_trait;
use database::{CancellationToken, Store, UnitOfWork};
use mediator::CurrentUser;
use uuid::Uuid;

use crate::models::{Team, TeamMember};

pub const SYSTEM_ADMIN_ROLE: &str = "SystemAdmin";
pub const PROJECT_MANAGER_ROLE: &str = "ProjectManager";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamVisibility: Send + Sync {
    /// Teams the caller may see; `None` means all of them.
    ///
    /// Store reads stop with `DatabaseError::Cancelled` once `cancellation`
    /// fires.
    async fn accessible_team_ids(
        &self,
        cancellation: CancellationToken,
    ) -> eyre::Result<Option<Vec<Uuid>>>;

    /// Decided from the caller's roles alone; never reads the store.
    async fn can_manage_members(&self) -> eyre::Result<bool>;
}

/// Role-based visibility backed by the team tables.
///
/// - System administrators see every team.
/// - Project managers see the teams they created.
/// - Everyone else sees the teams created by whoever created their own team.
/// - Anonymous callers see nothing.
pub struct RoleTeamVisibility {
    store: Store,
    current_user: Arc<dyn CurrentUser>,
}

impl RoleTeamVisibility {
    pub fn new(store: Store, current_user: Arc<dyn CurrentUser>) -> Self {
        Self { store, current_user }
    }

    async fn teams_created_by(&self, uow: &UnitOfWork, creator: Uuid) -> eyre::Result<Vec<Uuid>> {
        let teams = uow.repository::<Team>().get_all().await?;
        Ok(teams
            .into_iter()
            .filter(|team| team.created_by == Some(creator))
            .map(|team| team.team_id)
            .collect())
    }
}

#[async_trait]
impl TeamVisibility for RoleTeamVisibility {
    async fn accessible_team_ids(
        &self,
        cancellation: CancellationToken,
    ) -> eyre::Result<Option<Vec<Uuid>>> {
        let Some(user_id) = self.current_user.user_id() else {
            return Ok(Some(Vec::new()));
        };

        if self.current_user.is_in_role(SYSTEM_ADMIN_ROLE) {
            return Ok(None);
        }

        let uow = UnitOfWork::with_cancellation(&self.store, cancellation);
        if self.current_user.is_in_role(PROJECT_MANAGER_ROLE) {
            return Ok(Some(self.teams_created_by(&uow, user_id).await?));
        }

        let membership = uow
            .repository::<TeamMember>()
            .get_all()
            .await?
            .into_iter()
            .find(|member| member.user_id == Some(user_id));
        let Some(membership) = membership else {
            return Ok(Some(Vec::new()));
        };

        let own_team = uow.repository::<Team>().get_by_id(&membership.team_id).await?;
        match own_team.and_then(|team| team.created_by) {
            Some(creator) => Ok(Some(self.teams_created_by(&uow, creator).await?)),
            None => Ok(Some(Vec::new())),
        }
    }

    async fn can_manage_members(&self) -> eyre::Result<bool> {
        Ok(self.current_user.is_authenticated()
            && (self.current_user.is_in_role(SYSTEM_ADMIN_ROLE)
                || self.current_user.is_in_role(PROJECT_MANAGER_ROLE)))
    }
}
