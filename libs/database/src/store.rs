//! In-memory backing store.
//!
//! One table per entity type, keyed by the type's `TypeId`. The store is the
//! only state shared between requests; its `RwLock` provides the isolation
//! that concurrent units of work rely on. Locks are never held across an
//! `.await`.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};
use crate::entity::Entity;

pub(crate) struct Table<E: Entity> {
    rows: BTreeMap<E::Key, E>,
    next_identity: i64,
}

impl<E: Entity> Table<E> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_identity: 1,
        }
    }

    pub(crate) fn get(&self, key: &E::Key) -> Option<&E> {
        self.rows.get(key)
    }

    pub(crate) fn contains(&self, key: &E::Key) -> bool {
        self.rows.contains_key(key)
    }

    pub(crate) fn upsert(&mut self, entity: E) {
        let key = entity.key();
        if let Some(identity) = identity_value(&key) {
            self.next_identity = self.next_identity.max(identity + 1);
        }
        self.rows.insert(key, entity);
    }

    pub(crate) fn remove(&mut self, key: &E::Key) -> Option<E> {
        self.rows.remove(key)
    }

    fn reserve_identity(&mut self) -> i64 {
        let identity = self.next_identity;
        self.next_identity += 1;
        identity
    }
}

/// Keeps the identity sequence ahead of explicitly keyed integer rows.
fn identity_value<K: Any>(key: &K) -> Option<i64> {
    let key: &dyn Any = key;
    key.downcast_ref::<i64>().copied()
}

/// Every table in the store
#[derive(Default)]
pub struct Tables {
    tables: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Tables {
    pub(crate) fn table<E: Entity>(&self) -> DatabaseResult<Option<&Table<E>>> {
        match self.tables.get(&TypeId::of::<E>()) {
            None => Ok(None),
            Some(table) => table
                .downcast_ref::<Table<E>>()
                .map(Some)
                .ok_or(DatabaseError::TableTypeMismatch(E::NAME)),
        }
    }

    pub(crate) fn table_mut<E: Entity>(&mut self) -> DatabaseResult<&mut Table<E>> {
        self.tables
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Table::<E>::new()))
            .downcast_mut::<Table<E>>()
            .ok_or(DatabaseError::TableTypeMismatch(E::NAME))
    }

    /// Committed rows of `E` in key order, without any filtering.
    pub(crate) fn rows<E: Entity>(&self) -> DatabaseResult<Vec<&E>> {
        Ok(self
            .table::<E>()?
            .map(|table| table.rows.values().collect())
            .unwrap_or_default())
    }

    pub(crate) fn find<E: Entity>(&self, key: &E::Key) -> DatabaseResult<Option<&E>> {
        Ok(self.table::<E>()?.and_then(|table| table.get(key)))
    }
}

/// Read access to committed rows while expanding include paths.
///
/// Ambient query filters apply to related rows as well.
pub struct Related<'a> {
    tables: &'a Tables,
}

impl<'a> Related<'a> {
    pub(crate) fn new(tables: &'a Tables) -> Self {
        Self { tables }
    }

    pub fn find<T: Entity>(&self, key: &T::Key) -> DatabaseResult<Option<T>> {
        Ok(self
            .tables
            .find::<T>(key)?
            .filter(|row| row.passes_query_filters())
            .cloned())
    }

    pub fn filter<T, F>(&self, predicate: F) -> DatabaseResult<Vec<T>>
    where
        T: Entity,
        F: Fn(&T) -> bool,
    {
        Ok(self
            .tables
            .rows::<T>()?
            .into_iter()
            .filter(|row| row.passes_query_filters() && predicate(*row))
            .cloned()
            .collect())
    }
}

/// Shared handle to the backing store
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Tables>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> DatabaseResult<RwLockReadGuard<'_, Tables>> {
        self.inner.read().map_err(|_| DatabaseError::Poisoned)
    }

    pub(crate) fn write(&self) -> DatabaseResult<RwLockWriteGuard<'_, Tables>> {
        self.inner.write().map_err(|_| DatabaseError::Poisoned)
    }

    /// Insert rows directly, bypassing change tracking.
    ///
    /// Rows waiting for an identity get one from the table's sequence.
    /// Existing rows with the same key are replaced.
    pub fn seed<E, I>(&self, rows: I) -> DatabaseResult<usize>
    where
        E: Entity,
        I: IntoIterator<Item = E>,
    {
        let mut tables = self.write()?;
        let table = tables.table_mut::<E>()?;
        let mut seeded = 0;
        for mut row in rows {
            if row.identity_pending() {
                row.assign_identity(table.reserve_identity());
            }
            table.upsert(row);
            seeded += 1;
        }
        debug!(entity = E::NAME, seeded, "Seeded table");
        Ok(seeded)
    }

    /// Next value of `E`'s identity sequence. Values are never handed out
    /// twice, even if the row that reserved one is never saved.
    pub(crate) fn reserve_identity<E: Entity>(&self) -> DatabaseResult<i64> {
        let mut tables = self.write()?;
        Ok(tables.table_mut::<E>()?.reserve_identity())
    }

    /// Number of committed rows of `E`, ignoring query filters.
    pub fn row_count<E: Entity>(&self) -> DatabaseResult<usize> {
        let tables = self.read()?;
        Ok(tables.table::<E>()?.map_or(0, |table| table.rows.len()))
    }
}
