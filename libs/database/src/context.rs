//! Request-scoped persistence context with change tracking.
//!
//! Writes are staged here and reach the [`Store`] only through
//! [`DbContext::save_changes`], which applies the whole batch or nothing.

use std::any::Any;
use std::sync::{Mutex, MutexGuard};

use crate::cancellation::CancellationToken;
use tracing::{debug, error, info};

use crate::common::{DatabaseError, DatabaseResult};
use crate::entity::Entity;
use crate::store::{Store, Tables};

/// State of a staged change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
}

trait TrackedChange: Send + Sync {
    fn entity_name(&self) -> &'static str;
    fn key_display(&self) -> String;
    fn validate(&self, tables: &Tables) -> DatabaseResult<()>;
    fn apply(&self, tables: &mut Tables) -> DatabaseResult<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Tracked<E: Entity> {
    state: EntityState,
    entity: E,
}

impl<E: Entity> TrackedChange for Tracked<E> {
    fn entity_name(&self) -> &'static str {
        E::NAME
    }

    fn key_display(&self) -> String {
        format!("{:?}", self.entity.key())
    }

    fn validate(&self, tables: &Tables) -> DatabaseResult<()> {
        let key = self.entity.key();
        let exists = tables
            .table::<E>()?
            .is_some_and(|table| table.contains(&key));

        match (self.state, exists) {
            (EntityState::Added, true) => Err(DatabaseError::DuplicateKey {
                entity: E::NAME,
                key: self.key_display(),
            }),
            (EntityState::Modified | EntityState::Deleted, false) => {
                Err(DatabaseError::ConcurrencyConflict {
                    entity: E::NAME,
                    key: self.key_display(),
                })
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, tables: &mut Tables) -> DatabaseResult<()> {
        let table = tables.table_mut::<E>()?;
        match self.state {
            EntityState::Added | EntityState::Modified => table.upsert(self.entity.clone()),
            EntityState::Deleted => {
                table.remove(&self.entity.key());
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What the change tracker knows about a key
pub(crate) enum Local<E> {
    Tracked(E),
    Removed,
}

type Changes = Vec<Box<dyn TrackedChange>>;

/// Persistence context shared by every repository of one unit of work
pub struct DbContext {
    store: Store,
    changes: Mutex<Changes>,
    cancellation: CancellationToken,
}

impl DbContext {
    pub fn new(store: Store) -> Self {
        Self::with_cancellation(store, CancellationToken::new())
    }

    pub fn with_cancellation(store: Store, cancellation: CancellationToken) -> Self {
        Self {
            store,
            changes: Mutex::new(Vec::new()),
            cancellation,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fails with [`DatabaseError::Cancelled`] once the caller gave up.
    pub(crate) fn ensure_active(&self) -> DatabaseResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        Ok(())
    }

    fn changes(&self) -> DatabaseResult<MutexGuard<'_, Changes>> {
        self.changes.lock().map_err(|_| DatabaseError::Poisoned)
    }

    fn position<E: Entity>(changes: &Changes, key: &E::Key) -> Option<(usize, EntityState)> {
        changes.iter().enumerate().find_map(|(index, change)| {
            change
                .as_any()
                .downcast_ref::<Tracked<E>>()
                .filter(|tracked| tracked.entity.key() == *key)
                .map(|tracked| (index, tracked.state))
        })
    }

    fn replace<E: Entity>(changes: &mut Changes, index: usize, state: EntityState, entity: E) {
        if let Some(tracked) = changes
            .get_mut(index)
            .and_then(|change| change.as_any_mut().downcast_mut::<Tracked<E>>())
        {
            tracked.state = state;
            tracked.entity = entity;
        }
    }

    /// Stage an insert. Rows waiting for an identity receive one now, so the
    /// returned copy carries its final key.
    pub(crate) fn stage_add<E: Entity>(&self, mut entity: E) -> DatabaseResult<E> {
        if entity.identity_pending() {
            entity.assign_identity(self.store.reserve_identity::<E>()?);
        }

        let key = entity.key();
        let mut changes = self.changes()?;
        match Self::position::<E>(&changes, &key) {
            // Re-adding a row removed earlier in this unit of work
            Some((index, EntityState::Deleted)) => {
                Self::replace(&mut changes, index, EntityState::Modified, entity.clone());
            }
            Some(_) => {
                return Err(DatabaseError::AlreadyTracked {
                    entity: E::NAME,
                    key: format!("{:?}", key),
                });
            }
            None => changes.push(Box::new(Tracked {
                state: EntityState::Added,
                entity: entity.clone(),
            })),
        }

        debug!(entity = E::NAME, key = ?key, "Staged insert");
        Ok(entity)
    }

    pub(crate) fn stage_update<E: Entity>(&self, entity: E) -> DatabaseResult<()> {
        let key = entity.key();
        let mut changes = self.changes()?;
        match Self::position::<E>(&changes, &key) {
            // Still an insert as far as the store is concerned
            Some((index, EntityState::Added)) => {
                Self::replace(&mut changes, index, EntityState::Added, entity);
            }
            Some((index, _)) => {
                Self::replace(&mut changes, index, EntityState::Modified, entity);
            }
            None => changes.push(Box::new(Tracked {
                state: EntityState::Modified,
                entity,
            })),
        }

        debug!(entity = E::NAME, key = ?key, "Staged update");
        Ok(())
    }

    pub(crate) fn stage_delete<E: Entity>(&self, entity: E) -> DatabaseResult<()> {
        let key = entity.key();
        let mut changes = self.changes()?;
        match Self::position::<E>(&changes, &key) {
            // Never reached the store: just stop tracking it
            Some((index, EntityState::Added)) => {
                changes.remove(index);
            }
            Some((index, _)) => {
                Self::replace(&mut changes, index, EntityState::Deleted, entity);
            }
            None => changes.push(Box::new(Tracked {
                state: EntityState::Deleted,
                entity,
            })),
        }

        debug!(entity = E::NAME, key = ?key, "Staged delete");
        Ok(())
    }

    /// Staged view of a key, if the tracker holds one.
    pub(crate) fn local<E: Entity>(&self, key: &E::Key) -> DatabaseResult<Option<Local<E>>> {
        let changes = self.changes()?;
        Ok(changes
            .iter()
            .filter_map(|change| change.as_any().downcast_ref::<Tracked<E>>())
            .find(|tracked| tracked.entity.key() == *key)
            .map(|tracked| match tracked.state {
                EntityState::Deleted => Local::Removed,
                EntityState::Added | EntityState::Modified => {
                    Local::Tracked(tracked.entity.clone())
                }
            }))
    }

    /// State of a tracked key, `None` when the key is not tracked.
    pub fn entry_state<E: Entity>(&self, key: &E::Key) -> DatabaseResult<Option<EntityState>> {
        let changes = self.changes()?;
        Ok(Self::position::<E>(&changes, key).map(|(_, state)| state))
    }

    pub fn pending_changes(&self) -> DatabaseResult<usize> {
        Ok(self.changes()?.len())
    }

    /// Drop every staged change without touching the store.
    pub fn discard_changes(&self) -> DatabaseResult<usize> {
        let mut changes = self.changes()?;
        let discarded = changes.len();
        changes.clear();
        Ok(discarded)
    }

    /// Flush every staged change as one atomic batch.
    ///
    /// All changes are checked against the committed tables before any of
    /// them is applied. On failure nothing is written and the staged changes
    /// stay in place; the error is returned as is.
    pub async fn save_changes(&self) -> DatabaseResult<usize> {
        self.ensure_active()?;

        let mut changes = self.changes()?;
        if changes.is_empty() {
            return Ok(0);
        }

        let mut tables = self.store.write()?;
        for change in changes.iter() {
            if let Err(err) = change.validate(&tables) {
                error!(
                    entity = change.entity_name(),
                    key = %change.key_display(),
                    error = %err,
                    "Rejected staged changes"
                );
                return Err(err);
            }
        }

        for change in changes.iter() {
            change.apply(&mut tables)?;
        }

        let affected = changes.len();
        changes.clear();
        info!(affected, "Saved changes");
        Ok(affected)
    }
}
