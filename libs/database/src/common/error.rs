/// Unified error type for the data-access layer
///
/// Persistence failures surface through this type unchanged: the layer never
/// retries or compensates, it only reports.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The caller's cancellation token fired before the store was reached
    #[error("Operation cancelled")]
    Cancelled,

    /// An insert collided with a committed row
    #[error("Duplicate key for {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// An update or delete targeted a row that no longer exists
    #[error("{entity} {key} was modified or deleted by another unit of work")]
    ConcurrencyConflict { entity: &'static str, key: String },

    /// A second instance with the same key was added to one unit of work
    #[error("{entity} {key} is already tracked by this unit of work")]
    AlreadyTracked { entity: &'static str, key: String },

    /// Include path that the entity does not know how to expand
    #[error("Unknown navigation '{path}' on {entity}")]
    UnknownNavigation { entity: &'static str, path: String },

    /// A table slot held rows of a different entity type
    #[error("Table for {0} holds an unexpected row type")]
    TableTypeMismatch(&'static str),

    /// A thread panicked while holding a store lock
    #[error("Store lock poisoned")]
    Poisoned,
}

impl DatabaseError {
    /// Whether retrying the whole unit of work could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateKey { .. } | DatabaseError::ConcurrencyConflict { .. }
        )
    }
}

/// Result type alias for data-access operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
