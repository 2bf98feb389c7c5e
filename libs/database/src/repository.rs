use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::common::DatabaseResult;
use crate::context::{DbContext, Local};
use crate::entity::Entity;
use crate::evaluator::SpecificationEvaluator;
use crate::specification::{Predicate, Specification};
use crate::store::Related;

/// CRUD and specification reads for one entity type.
///
/// Writes are staged on the shared [`DbContext`] and only reach the store when
/// the owning [`UnitOfWork`](crate::UnitOfWork) completes. Reads other than
/// [`get_by_id`](Self::get_by_id) see committed rows only and return detached
/// copies.
pub struct GenericRepository<E: Entity> {
    context: Arc<DbContext>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> GenericRepository<E> {
    pub fn new(context: Arc<DbContext>) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// Stage an insert and return the entity with its final key.
    pub async fn add(&self, entity: E) -> DatabaseResult<E> {
        self.context.ensure_active()?;
        self.context.stage_add(entity)
    }

    /// Stage several inserts. An empty batch does nothing.
    pub async fn add_range(&self, entities: Vec<E>) -> DatabaseResult<Vec<E>> {
        if entities.is_empty() {
            return Ok(entities);
        }

        self.context.ensure_active()?;
        entities
            .into_iter()
            .map(|entity| self.context.stage_add(entity))
            .collect()
    }

    /// Look up one row by key.
    ///
    /// Staged inserts and updates of this unit of work are returned before the
    /// store is consulted; a staged delete hides the row.
    pub async fn get_by_id(&self, key: &E::Key) -> DatabaseResult<Option<E>> {
        match self.context.local::<E>(key)? {
            Some(Local::Tracked(entity)) => return Ok(Some(entity)),
            Some(Local::Removed) => return Ok(None),
            None => {}
        }

        self.context.ensure_active()?;
        let tables = self.context.store().read()?;
        Ok(tables
            .find::<E>(key)?
            .filter(|row| row.passes_query_filters())
            .cloned())
    }

    /// Every committed row, re-read on each call.
    pub async fn get_all(&self) -> DatabaseResult<Vec<E>> {
        self.context.ensure_active()?;
        self.get()
    }

    /// Synchronous form of [`get_all`](Self::get_all).
    pub fn get(&self) -> DatabaseResult<Vec<E>> {
        let tables = self.context.store().read()?;
        Ok(tables
            .rows::<E>()?
            .into_iter()
            .filter(|row| row.passes_query_filters())
            .cloned()
            .collect())
    }

    /// Evaluate `spec` against every committed row.
    ///
    /// Returns the page of rows with their includes resolved and the total
    /// count (0 unless the specification asked for it).
    pub async fn get_with_spec(&self, spec: &Specification<E>) -> DatabaseResult<(Vec<E>, usize)> {
        self.context.ensure_active()?;
        let (query, total_count) = SpecificationEvaluator::get_query(self.committed()?, spec);

        let includes = query.includes().to_vec();
        let split_query = query.is_split_query();
        let rows = self.resolve_includes(query.into_rows(), &includes, split_query)?;
        Ok((rows, total_count))
    }

    /// First row selected by `spec`, if any.
    pub async fn get_entity_with_spec(&self, spec: &Specification<E>) -> DatabaseResult<Option<E>> {
        self.context.ensure_active()?;
        let (query, _) = SpecificationEvaluator::get_query(self.committed()?, spec);

        let includes = query.includes().to_vec();
        let split_query = query.is_split_query();
        let first: Vec<E> = query.into_rows().into_iter().take(1).collect();
        Ok(self
            .resolve_includes(first, &includes, split_query)?
            .into_iter()
            .next())
    }

    pub fn update(&self, entity: E) -> DatabaseResult<()> {
        self.context.stage_update(entity)
    }

    pub fn update_range(&self, entities: Vec<E>) -> DatabaseResult<()> {
        entities
            .into_iter()
            .try_for_each(|entity| self.context.stage_update(entity))
    }

    pub fn delete(&self, entity: E) -> DatabaseResult<()> {
        self.context.stage_delete(entity)
    }

    pub fn delete_range(&self, entities: Vec<E>) -> DatabaseResult<()> {
        entities
            .into_iter()
            .try_for_each(|entity| self.context.stage_delete(entity))
    }

    /// Whether any committed row matches.
    pub async fn is_exist<F>(&self, filter: F) -> DatabaseResult<bool>
    where
        F: Fn(&E) -> bool,
    {
        self.context.ensure_active()?;
        let tables = self.context.store().read()?;
        Ok(tables
            .rows::<E>()?
            .into_iter()
            .any(|row| row.passes_query_filters() && filter(row)))
    }

    /// Number of committed rows, optionally restricted by `filter`.
    pub async fn count(&self, filter: Option<Predicate<E>>) -> DatabaseResult<usize> {
        self.context.ensure_active()?;
        let tables = self.context.store().read()?;
        Ok(tables
            .rows::<E>()?
            .into_iter()
            .filter(|row| row.passes_query_filters())
            .filter(|row| filter.as_ref().is_none_or(|matches| matches(*row)))
            .count())
    }

    /// Committed rows before any query filter; the evaluator decides.
    fn committed(&self) -> DatabaseResult<Vec<E>> {
        let tables = self.context.store().read()?;
        Ok(tables.rows::<E>()?.into_iter().cloned().collect())
    }

    /// Expand include paths for the rows that survived paging.
    ///
    /// A single query reads every path from one snapshot. A split query
    /// takes a fresh snapshot per path.
    fn resolve_includes(
        &self,
        mut rows: Vec<E>,
        includes: &[String],
        split_query: bool,
    ) -> DatabaseResult<Vec<E>> {
        if rows.is_empty() || includes.is_empty() {
            return Ok(rows);
        }

        if split_query {
            for path in includes {
                self.context.ensure_active()?;
                let tables = self.context.store().read()?;
                let related = Related::new(&tables);
                for row in rows.iter_mut() {
                    row.load_navigation(path, &related)?;
                }
            }
        } else {
            let tables = self.context.store().read()?;
            let related = Related::new(&tables);
            for path in includes {
                for row in rows.iter_mut() {
                    row.load_navigation(path, &related)?;
                }
            }
        }

        debug!(
            entity = E::NAME,
            rows = rows.len(),
            paths = includes.len(),
            split_query,
            "Resolved includes"
        );
        Ok(rows)
    }
}
