use std::fmt::Debug;

use crate::common::{DatabaseError, DatabaseResult};
use crate::store::Related;

/// A persistable row type.
///
/// Keys may be UUIDs, integers or strings; anything ordered and cloneable
/// works. Rows are compared with `PartialEq` when a query asks for distinct
/// results.
pub trait Entity: Clone + Debug + PartialEq + Send + Sync + 'static {
    type Key: Clone + Ord + Debug + Send + Sync + 'static;

    /// Name used in logs and error messages
    const NAME: &'static str;

    fn key(&self) -> Self::Key;

    /// Whether the row still waits for a store-generated identity.
    fn identity_pending(&self) -> bool {
        false
    }

    /// Receives the next value of the table's identity sequence.
    fn assign_identity(&mut self, _identity: i64) {}

    /// Ambient row-level filter applied to every query unless a
    /// specification opts out.
    fn passes_query_filters(&self) -> bool {
        true
    }

    /// Expand one include path (`"Department"`, `"TeamLeader"`, ...).
    fn load_navigation(&mut self, path: &str, _related: &Related<'_>) -> DatabaseResult<()> {
        Err(DatabaseError::UnknownNavigation {
            entity: Self::NAME,
            path: path.to_string(),
        })
    }
}
