use thiserror::Error;

/// Dispatch errors
#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("No handler registered for {request}")]
    HandlerNotRegistered { request: &'static str },
}
