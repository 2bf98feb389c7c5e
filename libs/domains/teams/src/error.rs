use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TeamError {
    #[error("Team with this code already exists")]
    DuplicateCode,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error(
        "Access denied. Only System Administrators and Project Managers can assign crew leaders."
    )]
    AccessDenied,

    #[error("Crew not found")]
    TeamNotFound,

    #[error("Crew member not found")]
    MemberNotFound,

    #[error("The selected crew member does not belong to this crew")]
    MemberOfAnotherTeam,

    #[error("Cannot assign an inactive crew member as crew leader")]
    InactiveMember,
}
