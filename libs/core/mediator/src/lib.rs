//! Request dispatch and the result envelope shared by every handler.
//!
//! - [`Request`] / [`RequestHandler`]: one handler per command or query
//! - [`Mediator`]: type-keyed routing from request to handler
//! - [`Validated`]: runs `validator` rules before the wrapped handler
//! - [`Outcome`]: `{ isSuccess, message, data?, totalCount?, errors? }`
//! - [`PaginatedResponse`] / [`PageRequest`]: paging envelope and bounds
//! - [`CurrentUser`]: who is sending the request

pub mod dispatch;
pub mod error;
pub mod identity;
pub mod outcome;
pub mod paging;
pub mod request;
pub mod validation;

pub use dispatch::Mediator;
pub use error::MediatorError;
pub use identity::{CurrentUser, FixedUser};
pub use outcome::{
    FAILURE_MESSAGE, NULL_VALUE_MESSAGE, Outcome, SUCCESS_MESSAGE, VALIDATION_MESSAGE,
};
pub use paging::{PageRequest, PaginatedResponse};
pub use request::{Request, RequestHandler};
pub use validation::{Validated, validation_messages};
