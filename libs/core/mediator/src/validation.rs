//! Input validation in front of a handler.
//!
//! Requests derive [`validator::Validate`]; [`Validated`] runs the rules and
//! turns any violation into a failed [`Outcome`] without calling the wrapped
//! handler.

use std::any::type_name;
use std::collections::BTreeSet;

use async_trait::async_trait;
use database::CancellationToken;
use tracing::warn;
use validator::{Validate, ValidationErrors};

use crate::outcome::Outcome;
use crate::request::{Request, RequestHandler};

/// Key `validator` uses for struct-level (schema) rules
const SCHEMA_FIELD: &str = "__all__";

/// Flatten field errors into `"{field} {message}"` strings.
///
/// Missing messages fall back to the rule code. The list is deduplicated and
/// sorted so the same input always yields the same errors.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = BTreeSet::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            let message = error
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| error.code.to_string());

            if field == SCHEMA_FIELD {
                messages.insert(message);
            } else {
                messages.insert(format!("{} {}", field, message));
            }
        }
    }
    messages.into_iter().collect()
}

/// Handler wrapper that validates the request first
pub struct Validated<H> {
    inner: H,
}

impl<H> Validated<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<R, H> RequestHandler<R> for Validated<H>
where
    R: Request + Validate,
    H: RequestHandler<R>,
{
    async fn handle(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<R::Response>> {
        let messages = match request.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_messages(&errors),
        };

        if !messages.is_empty() {
            warn!(request = type_name::<R>(), errors = ?messages, "Request failed validation");
            return Ok(Outcome::validation_failure(messages));
        }

        self.inner.handle(request, cancellation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use validator::ValidationError;

    #[derive(Debug, Clone, Validate)]
    #[validate(schema(function = "validate_window"))]
    struct Reserve {
        #[validate(length(min = 1, message = "is required"))]
        code: String,
        #[validate(range(min = 1))]
        quantity: u32,
        from: u32,
        to: u32,
    }

    fn validate_window(reserve: &Reserve) -> Result<(), ValidationError> {
        if reserve.from > reserve.to {
            let mut error = ValidationError::new("window");
            error.message = Some("Start must not be after end".into());
            return Err(error);
        }
        Ok(())
    }

    impl Request for Reserve {
        type Response = String;
    }

    mock! {
        ReserveHandler {}

        #[async_trait]
        impl RequestHandler<Reserve> for ReserveHandler {
            async fn handle(
                &self,
                request: Reserve,
                cancellation: CancellationToken,
            ) -> eyre::Result<Outcome<String>>;
        }
    }

    fn reserve(code: &str, quantity: u32) -> Reserve {
        Reserve {
            code: code.to_string(),
            quantity,
            from: 1,
            to: 2,
        }
    }

    #[tokio::test]
    async fn test_valid_request_reaches_handler() {
        let mut inner = MockReserveHandler::new();
        inner
            .expect_handle()
            .times(1)
            .returning(|request, _| Ok(Outcome::success(request.code)));

        let handler = Validated::new(inner);
        let outcome = handler
            .handle(reserve("R-1", 2), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.into_data(), Some("R-1".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_request_short_circuits() {
        let mut inner = MockReserveHandler::new();
        inner.expect_handle().never();

        let handler = Validated::new(inner);
        let outcome = handler
            .handle(reserve("", 0), CancellationToken::new())
            .await
            .unwrap();

        assert!(outcome.is_failure());
        assert_eq!(outcome.message(), "One or more validation errors occurred.");
        assert_eq!(outcome.errors(), ["code is required", "quantity range"]);
    }

    #[tokio::test]
    async fn test_schema_errors_are_reported_without_field() {
        let mut inner = MockReserveHandler::new();
        inner.expect_handle().never();

        let mut request = reserve("R-1", 1);
        request.from = 5;

        let outcome = Validated::new(inner)
            .handle(request, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.errors(), ["Start must not be after end"]);
    }
}
