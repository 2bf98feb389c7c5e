//! Error types shared by every part of the data-access layer

pub mod error;

pub use error::{DatabaseError, DatabaseResult};
