use async_trait::async_trait;
use database::CancellationToken;

use crate::outcome::Outcome;

/// A command or query. Each request type has exactly one handler.
pub trait Request: Send + 'static {
    /// Payload of a successful [`Outcome`]
    type Response: Send + 'static;
}

/// Handles one request type.
///
/// Business failures (not found, duplicate code, ...) are returned as a failed
/// [`Outcome`]. `Err` is reserved for infrastructure failures such as a
/// rejected flush, which callers may downcast to the underlying error.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<R::Response>>;
}
