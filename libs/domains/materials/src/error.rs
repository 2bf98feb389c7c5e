use thiserror::Error;

/// Business rule violations reported back to the caller as failed outcomes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("Material with this code already exists")]
    DuplicateCode,

    #[error("Material not found.")]
    NotFound,

    #[error("Cannot update: Material Code already exists for another material.")]
    CodeTaken,

    #[error("Material not found")]
    RestockTargetMissing,

    #[error("Inspector user not found")]
    UnknownInspector,

    #[error("Quantity must be greater than zero for a restock operation.")]
    NonPositiveQuantity,
}
