//! Data-access layer: specifications, generic repositories and units of work
//! over an in-memory backing store.
//!
//! # Overview
//!
//! - [`Store`] holds the committed rows, one table per [`Entity`] type.
//! - [`UnitOfWork`] scopes one request. It owns a [`DbContext`] that stages
//!   writes and hands out one [`GenericRepository`] per entity type.
//! - [`Specification`] describes a query; [`SpecificationEvaluator`] applies
//!   it in a fixed order and reports the total count before paging.
//!
//! # Example
//!
//! ```ignore
//! use database::{Specification, Store, UnitOfWork};
//!
//! let store = Store::new();
//! let uow = UnitOfWork::new(&store);
//!
//! let mut spec = Specification::<AuditLog>::new();
//! spec.add_criteria(|log| log.table_name == "Materials")
//!     .add_order_by_descending(|log| log.changed_date)
//!     .apply_paging(25, 1);
//!
//! let (page, total_count) = uow.repository::<AuditLog>().get_with_spec(&spec).await?;
//! ```

pub mod cancellation;
pub mod common;
pub mod context;
pub mod entity;
pub mod evaluator;
pub mod repository;
pub mod specification;
pub mod store;
pub mod unit_of_work;

pub use cancellation::CancellationToken;
pub use common::{DatabaseError, DatabaseResult};
pub use context::{DbContext, EntityState};
pub use entity::Entity;
pub use evaluator::{Query, QueryStep, SpecificationEvaluator};
pub use repository::GenericRepository;
pub use specification::{OrderKey, Predicate, Specification, predicate};
pub use store::{Related, Store};
pub use unit_of_work::UnitOfWork;

