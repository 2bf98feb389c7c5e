use database::Specification;
use uuid::Uuid;

use crate::models::{INCLUDE_DEPARTMENT, INCLUDE_MEMBERS, INCLUDE_TEAM_LEADER, Team};

fn with_team_includes(spec: &mut Specification<Team>) {
    spec.add_includes([INCLUDE_DEPARTMENT, INCLUDE_TEAM_LEADER, INCLUDE_MEMBERS])
        .enable_split_query();
}

/// One team with department, leader and members loaded
pub fn team_with_includes(team_id: Uuid) -> Specification<Team> {
    let mut spec = Specification::with_criteria(move |team: &Team| team.team_id == team_id);
    with_team_includes(&mut spec);
    spec
}

/// Filters accepted by [`team_search`].
///
/// Criteria run before includes are loaded, so matches on department and
/// leader names arrive pre-resolved as keys.
#[derive(Debug, Clone, Default)]
pub struct TeamSearch {
    pub search: Option<String>,
    pub trade: Option<String>,
    pub is_active: Option<bool>,
    /// `None` means every team is visible
    pub accessible_team_ids: Option<Vec<Uuid>>,
    /// Departments selected by name; `None` when not filtering by department
    pub department_codes: Option<Vec<String>>,
    /// Departments whose name contains the search term
    pub search_department_codes: Vec<String>,
    /// Members whose name contains the search term
    pub search_leader_ids: Vec<Uuid>,
}

/// Page of teams with includes, ordered by code.
pub fn team_search(filter: TeamSearch, page_size: u32, page: u32) -> Specification<Team> {
    let mut spec = Specification::new();
    with_team_includes(&mut spec);

    if let Some(accessible) = filter.accessible_team_ids {
        spec.add_criteria(move |team: &Team| accessible.contains(&team.team_id));
    }

    if let Some(term) = filter
        .search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
    {
        let departments = filter.search_department_codes;
        let leaders = filter.search_leader_ids;
        spec.add_criteria(move |team: &Team| {
            team.team_code.to_lowercase().contains(&term)
                || team.team_name.to_lowercase().contains(&term)
                || departments.contains(&team.department_code)
                || team
                    .trade
                    .as_deref()
                    .is_some_and(|trade| trade.to_lowercase().contains(&term))
                || team
                    .team_leader_member_id
                    .is_some_and(|leader| leaders.contains(&leader))
        });
    }

    if let Some(codes) = filter.department_codes {
        spec.add_criteria(move |team: &Team| codes.contains(&team.department_code));
    }

    if let Some(trade) = filter.trade.filter(|t| !t.trim().is_empty()) {
        spec.add_criteria(move |team: &Team| team.trade.as_deref() == Some(trade.as_str()));
    }

    if let Some(is_active) = filter.is_active {
        spec.add_criteria(move |team: &Team| team.is_active == is_active);
    }

    // Ordering by code keeps the split query alive once paging is on; an
    // unordered page would have it switched off by the evaluator.
    spec.add_order_by(|team: &Team| team.team_code.clone())
        .apply_paging(page_size, page);
    spec
}
