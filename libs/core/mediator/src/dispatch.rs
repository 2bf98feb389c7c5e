use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use database::CancellationToken;
use tracing::{debug, error};

use crate::error::MediatorError;
use crate::outcome::Outcome;
use crate::request::{Request, RequestHandler};

type HandlerSlot = Box<dyn Any + Send + Sync>;

/// Routes each request to the one handler registered for its type
#[derive(Default)]
pub struct Mediator {
    handlers: HashMap<TypeId, HandlerSlot>,
}

impl Mediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `R`, replacing any earlier one.
    pub fn register<R, H>(&mut self, handler: H) -> &mut Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        if self
            .handlers
            .insert(TypeId::of::<R>(), Box::new(handler))
            .is_some()
        {
            debug!(request = type_name::<R>(), "Replaced request handler");
        }
        self
    }

    pub fn is_registered<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    fn handler<R: Request>(&self) -> Result<Arc<dyn RequestHandler<R>>, MediatorError> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
            .ok_or(MediatorError::HandlerNotRegistered {
                request: type_name::<R>(),
            })
    }

    /// Dispatch `request` to its handler.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> eyre::Result<Outcome<R::Response>> {
        let handler = self.handler::<R>()?;

        debug!(request = type_name::<R>(), "Dispatching request");
        let result = handler.handle(request, cancellation).await;
        if let Err(report) = &result {
            error!(request = type_name::<R>(), error = %report, "Request handler failed");
        }
        result
    }
}
