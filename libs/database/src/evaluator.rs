//! Turns a [`Specification`] plus a base collection into a shaped query.
//!
//! Rules apply in a fixed order:
//!
//! 1. ambient query filters (unless the specification ignores them)
//! 2. criteria
//! 3. descending order keys
//! 4. split-query guard: paging without any ordering turns split query off
//! 5. ascending order keys, replacing any descending order
//! 6. distinct
//! 7. total count, before includes and paging
//! 8. include paths
//! 9. split-query marker
//! 10. skip / take

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::entity::Entity;
use crate::specification::{OrderKey, Specification};

/// One applied step of an evaluated query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStep {
    IgnoreQueryFilters,
    Where,
    OrderByDescending(usize),
    SplitQueryDisabled,
    OrderBy(usize),
    Distinct,
    Count,
    Include(String),
    AsSplitQuery,
    Skip(usize),
    Take(usize),
}

/// Result of evaluating a specification.
///
/// Rows are filtered, ordered and paged. Include paths are recorded but not
/// resolved; the repository expands them for the rows that survive paging.
#[derive(Debug, Clone)]
pub struct Query<E> {
    rows: Vec<E>,
    includes: Vec<String>,
    split_query: bool,
    steps: Vec<QueryStep>,
}

impl<E> Query<E> {
    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<E> {
        self.rows
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Effective split-query flag, after the paging guard.
    pub fn is_split_query(&self) -> bool {
        self.split_query
    }

    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }
}

fn compare_by<E>(keys: &[OrderKey<E>], a: &E, b: &E) -> Ordering {
    keys.iter()
        .map(|key| key(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

pub struct SpecificationEvaluator;

impl SpecificationEvaluator {
    /// Apply `spec` to `base`, every committed row of `E`.
    ///
    /// Returns the shaped query and the total count, which is 0 unless the
    /// specification enabled it. The specification itself is left untouched.
    pub fn get_query<E: Entity>(base: Vec<E>, spec: &Specification<E>) -> (Query<E>, usize) {
        let mut rows = base;
        let mut steps = Vec::new();

        if spec.ignores_global_filters() {
            steps.push(QueryStep::IgnoreQueryFilters);
        } else {
            rows.retain(|row| row.passes_query_filters());
        }

        if let Some(criteria) = spec.criteria() {
            rows.retain(|row| criteria(row));
            steps.push(QueryStep::Where);
        }

        let mut ordering: Option<&[OrderKey<E>]> = None;
        if !spec.order_by_descending().is_empty() {
            ordering = Some(spec.order_by_descending());
            steps.push(QueryStep::OrderByDescending(spec.order_by_descending().len()));
        }

        let mut split_query = spec.is_split_query();
        if spec.is_paging_enabled() && !spec.has_ordering() && split_query {
            warn!(
                entity = E::NAME,
                "Split query requested for an unordered page, disabling it"
            );
            split_query = false;
            steps.push(QueryStep::SplitQueryDisabled);
        }

        // Applied after the descending keys, so it wins when both are set
        if !spec.order_by().is_empty() {
            ordering = Some(spec.order_by());
            steps.push(QueryStep::OrderBy(spec.order_by().len()));
        }

        if let Some(keys) = ordering {
            rows.sort_by(|a, b| compare_by(keys, a, b));
        }

        if spec.is_distinct() {
            let mut unique: Vec<E> = Vec::with_capacity(rows.len());
            for row in rows {
                if !unique.contains(&row) {
                    unique.push(row);
                }
            }
            rows = unique;
            steps.push(QueryStep::Distinct);
        }

        let mut total_count = 0;
        if spec.is_total_count_enabled() {
            total_count = rows.len();
            steps.push(QueryStep::Count);
        }

        steps.extend(
            spec.includes()
                .iter()
                .map(|path| QueryStep::Include(path.clone())),
        );

        if split_query {
            steps.push(QueryStep::AsSplitQuery);
        }

        if spec.is_paging_enabled() {
            rows = rows
                .into_iter()
                .skip(spec.skip())
                .take(spec.take())
                .collect();
            steps.push(QueryStep::Skip(spec.skip()));
            steps.push(QueryStep::Take(spec.take()));
        }

        debug!(entity = E::NAME, ?steps, total_count, rows = rows.len(), "Evaluated specification");

        let query = Query {
            rows,
            includes: spec.includes().to_vec(),
            split_query,
            steps,
        };
        (query, total_count)
    }
}
