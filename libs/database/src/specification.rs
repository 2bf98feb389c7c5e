use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

/// Composable row filter
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// One sort key, already bound to its direction
pub type OrderKey<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<E, F>(filter: F) -> Predicate<E>
where
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(filter)
}

/// Declarative description of a query over `E`.
///
/// A specification only records what should happen: filtering, related-data
/// expansion, ordering, paging and counting. [`SpecificationEvaluator`]
/// decides how those pieces combine.
///
/// ```
/// use database::Specification;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Row { status: &'static str, rank: u32 }
///
/// let mut spec = Specification::<Row>::new();
/// spec.add_criteria(|row| row.status == "Active")
///     .add_order_by_descending(|row| row.rank)
///     .apply_paging(10, 1);
///
/// assert!(spec.is_paging_enabled());
/// assert!(spec.is_total_count_enabled());
/// ```
///
/// [`SpecificationEvaluator`]: crate::SpecificationEvaluator
pub struct Specification<E> {
    criteria: Option<Predicate<E>>,
    includes: Vec<String>,
    order_by: Vec<OrderKey<E>>,
    order_by_descending: Vec<OrderKey<E>>,
    skip: usize,
    take: usize,
    paging_enabled: bool,
    total_count_enabled: bool,
    distinct: bool,
    ignore_global_filters: bool,
    split_query: bool,
}

impl<E: 'static> Specification<E> {
    pub fn new() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            order_by: Vec::new(),
            order_by_descending: Vec::new(),
            skip: 0,
            take: 0,
            paging_enabled: false,
            total_count_enabled: false,
            distinct: false,
            ignore_global_filters: false,
            split_query: false,
        }
    }

    /// Start from a single filter.
    pub fn with_criteria<F>(filter: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let mut spec = Self::new();
        spec.add_criteria(filter);
        spec
    }

    /// Narrow the filter. Repeated calls are AND-combined.
    pub fn add_criteria<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let combined: Predicate<E> = match self.criteria.take() {
            None => Arc::new(filter),
            Some(existing) => Arc::new(move |entity: &E| existing(entity) && filter(entity)),
        };
        self.criteria = Some(combined);
        self
    }

    /// Append a related-data path. Duplicates are kept.
    pub fn add_include(&mut self, path: impl Into<String>) -> &mut Self {
        self.includes.push(path.into());
        self
    }

    pub fn add_includes<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Append an ascending sort key; the first one added is the primary key.
    pub fn add_order_by<K, F>(&mut self, selector: F) -> &mut Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.order_by
            .push(Arc::new(move |a: &E, b: &E| selector(a).cmp(&selector(b))));
        self
    }

    /// Append a descending sort key; the first one added is the primary key.
    pub fn add_order_by_descending<K, F>(&mut self, selector: F) -> &mut Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.order_by_descending
            .push(Arc::new(move |a: &E, b: &E| selector(b).cmp(&selector(a))));
        self
    }

    /// Select one page. `page_index` is 1-based and also turns on the total
    /// count.
    ///
    /// A `page_index` of 0 is treated as the first page.
    pub fn apply_paging(&mut self, page_size: u32, page_index: u32) -> &mut Self {
        let page_index = if page_index == 0 {
            warn!(page_size, "Page index 0 requested, using the first page");
            1
        } else {
            page_index
        };

        self.skip = (page_size as usize).saturating_mul(page_index as usize - 1);
        self.take = page_size as usize;
        self.paging_enabled = true;
        self.total_count_enabled = true;
        self
    }

    pub fn enable_total_count(&mut self) -> &mut Self {
        self.total_count_enabled = true;
        self
    }

    /// Drop rows equal to an earlier row.
    pub fn enable_distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    /// Bypass [`Entity::passes_query_filters`](crate::Entity::passes_query_filters).
    pub fn ignore_global_filters(&mut self) -> &mut Self {
        self.ignore_global_filters = true;
        self
    }

    /// Resolve each include path in its own round-trip.
    pub fn enable_split_query(&mut self) -> &mut Self {
        self.split_query = true;
        self
    }

    pub fn criteria(&self) -> Option<&Predicate<E>> {
        self.criteria.as_ref()
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn order_by(&self) -> &[OrderKey<E>] {
        &self.order_by
    }

    pub fn order_by_descending(&self) -> &[OrderKey<E>] {
        &self.order_by_descending
    }

    pub fn has_ordering(&self) -> bool {
        !self.order_by.is_empty() || !self.order_by_descending.is_empty()
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn take(&self) -> usize {
        self.take
    }

    pub fn is_paging_enabled(&self) -> bool {
        self.paging_enabled
    }

    pub fn is_total_count_enabled(&self) -> bool {
        self.total_count_enabled
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn ignores_global_filters(&self) -> bool {
        self.ignore_global_filters
    }

    pub fn is_split_query(&self) -> bool {
        self.split_query
    }
}

impl<E: 'static> Default for Specification<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Specification<E> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            includes: self.includes.clone(),
            order_by: self.order_by.clone(),
            order_by_descending: self.order_by_descending.clone(),
            skip: self.skip,
            take: self.take,
            paging_enabled: self.paging_enabled,
            total_count_enabled: self.total_count_enabled,
            distinct: self.distinct,
            ignore_global_filters: self.ignore_global_filters,
            split_query: self.split_query,
        }
    }
}

impl<E> fmt::Debug for Specification<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("has_criteria", &self.criteria.is_some())
            .field("includes", &self.includes)
            .field("order_by", &self.order_by.len())
            .field("order_by_descending", &self.order_by_descending.len())
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("paging_enabled", &self.paging_enabled)
            .field("total_count_enabled", &self.total_count_enabled)
            .field("distinct", &self.distinct)
            .field("ignore_global_filters", &self.ignore_global_filters)
            .field("split_query", &self.split_query)
            .finish()
    }
}
