//! Audit Logs Domain
//!
//! Every change made through the other domains leaves an [`AuditLog`] entry.
//! This crate owns the entity and the paged, filtered listing of entries.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_audit_logs::{GetAuditLogsHandler, GetAuditLogsQuery};
//! use mediator::{Mediator, Validated};
//!
//! let mut mediator = Mediator::new();
//! mediator.register::<GetAuditLogsQuery, _>(Validated::new(GetAuditLogsHandler::new(
//!     store.clone(),
//!     PagingConfig::default(),
//! )));
//! ```

pub mod handlers;
pub mod models;
pub mod specifications;

pub use handlers::GetAuditLogsHandler;
pub use models::{AuditAction, AuditLog, AuditLogDto, FieldChange, GetAuditLogsQuery, field_changes};
pub use specifications::{AuditLogSearch, audit_log_search};
