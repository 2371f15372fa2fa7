//! Request dispatch over the registry.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{DispatchRequest, Registry, Response};
use crate::error::{DispatchError, HandlerError};

/// Hook invoked with every request before lookup
#[async_trait::async_trait]
pub trait RequestObserver: Send + Sync {
    async fn observe(&self, request: &DispatchRequest);
}

/// Resolves, validates and invokes capability handlers
pub struct Dispatcher {
    registry: Arc<Registry>,
    timeout: Duration,
    observers: Vec<Arc<dyn RequestObserver>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, timeout: Duration) -> Self {
        Self {
            registry,
            timeout,
            observers: Vec::new(),
        }
    }

    /// Add a request observer
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Serve one request.
    ///
    /// The handler runs on its own task: a panic surfaces as
    /// [`DispatchError::Internal`] and an overrun aborts the task and yields
    /// [`DispatchError::Timeout`].
    pub async fn dispatch(&self, request: DispatchRequest) -> Response {
        for observer in &self.observers {
            observer.observe(&request).await;
        }

        let DispatchRequest {
            kind,
            identifier,
            arguments,
        } = request;

        let record = match self.registry.lookup(kind, &identifier) {
            Ok(record) => Arc::clone(record),
            Err(_) => {
                debug!("{} not found: {}", kind, identifier);
                return Err(DispatchError::NotFound { kind, identifier });
            }
        };

        let arguments = record.shape.validate(arguments.as_ref()).map_err(|e| {
            debug!("Rejected arguments for {} {}: {}", kind, identifier, e);
            DispatchError::InvalidArguments(e)
        })?;

        let handler = Arc::clone(&record.handler);
        let mut task = tokio::spawn(async move { handler.handle(arguments).await });

        let outcome = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                warn!(
                    "{} {} exceeded {}ms, aborted",
                    kind,
                    identifier,
                    self.timeout.as_millis()
                );
                return Err(DispatchError::Timeout(self.timeout));
            }
        };

        match outcome {
            Ok(Ok(mut output)) => {
                if output.mime_type.is_none() {
                    output.mime_type = record.mime_type.clone();
                }
                Ok(output)
            }
            Ok(Err(HandlerError::Failed(message))) => {
                debug!("{} {} failed: {}", kind, identifier, message);
                Err(DispatchError::HandlerFailed(message))
            }
            Ok(Err(HandlerError::Unexpected(e))) => {
                error!("{} {} raised an unexpected error: {:#}", kind, identifier, e);
                Err(internal(kind, &identifier))
            }
            Err(join_error) => {
                error!("{} {} terminated abnormally: {}", kind, identifier, join_error);
                Err(internal(kind, &identifier))
            }
        }
    }
}

fn internal(kind: super::CapabilityKind, identifier: &str) -> DispatchError {
    DispatchError::Internal(format!("{} '{}' failed unexpectedly", kind, identifier))
}
