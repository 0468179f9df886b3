//! The `InsertDocument` pipeline and the shared state it runs against.
use crate::allocator::IdAllocator;
use crate::backend::{DocumentBackend, DocumentWrite, FallbackStore};
use crate::config::BackendConfig;
use crate::connector::{BackendConnector, Connection};
use crate::error::IngestError;
use crate::response::Outcome;
use crate::router::PersistenceRouter;
use crate::types::{IngestRequest, IngestResponse, ServiceMode};
use crate::validate::validate;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Service context: owns the allocator, the fallback store and the router.
///
/// Share it behind an `Arc`; every method takes `&self` and is safe to
/// call from many tasks at once.
///
/// ```rust
/// use docingest::{IngestRequest, IngestService, ServiceMode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let service = IngestService::simulated();
/// let resp = service
///     .insert_document(IngestRequest::new(r#"{"title":"x"}"#))
///     .await;
/// assert_eq!(resp.status_code, 200);
/// assert_eq!(service.mode(), ServiceMode::Simulated);
/// # }
/// ```
#[derive(Debug)]
pub struct IngestService {
    router: PersistenceRouter,
    allocator: IdAllocator,
    store: Arc<FallbackStore>,
}

impl IngestService {
    /// Run the connector against `config` and build the service around
    /// whatever it settled on.
    pub async fn connect(config: &BackendConfig) -> Self {
        Self::from_connection(BackendConnector::connect(config).await)
    }

    pub fn from_connection(connection: Connection) -> Self {
        let store = Arc::new(FallbackStore::new());
        let router = match connection {
            Connection::Connected(primary) => PersistenceRouter::connected(primary, store.clone()),
            Connection::Simulated => PersistenceRouter::simulated(store.clone()),
        };
        Self {
            router,
            allocator: IdAllocator::new(),
            store,
        }
    }

    /// Service that writes everything to the in-memory store.
    pub fn simulated() -> Self {
        Self::from_connection(Connection::Simulated)
    }

    /// Service in connected mode over an already established backend.
    pub fn with_backend(backend: Arc<dyn DocumentBackend>) -> Self {
        Self::from_connection(Connection::Connected(backend))
    }

    /// Mode chosen at startup. Not affected by degraded writes.
    pub fn mode(&self) -> ServiceMode {
        self.router.mode()
    }

    pub fn fallback_store(&self) -> &FallbackStore {
        &self.store
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Handle one request. Always returns a response, even if the
    /// pipeline panics.
    pub async fn insert_document(&self, request: IngestRequest) -> IngestResponse {
        let outcome = match AssertUnwindSafe(self.process(&request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Outcome::failed(IngestError::Internal(panic_message(panic.as_ref()))),
        };

        if let Outcome::Failed {
            error: error @ IngestError::Internal(_),
            ..
        } = &outcome
        {
            tracing::error!(%error, "document insertion failed unexpectedly");
        }
        outcome.into()
    }

    /// Validate, resolve the URI and route. Does not guard against panics.
    async fn process(&self, request: &IngestRequest) -> Outcome {
        tracing::info!("received document insertion request");
        tracing::debug!(
            payload_len = request.payload.len(),
            requested_uri = ?request.requested_uri(),
            collections = ?request.collections,
            mode = %self.mode(),
            "request details"
        );

        let content = match validate(request) {
            Ok(content) => content,
            Err(error) => return Outcome::failed(error),
        };

        let uri = self.allocator.resolve(request.requested_uri());
        self.router
            .route(DocumentWrite {
                uri: &uri,
                content: &content,
                collections: &request.collections,
                metadata: &request.metadata,
                size_bytes: request.payload.len(),
            })
            .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::parse_allocated;
    use crate::error::BackendError;
    use async_trait::async_trait;

    struct Panicking;

    #[async_trait]
    impl DocumentBackend for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn insert(&self, _write: DocumentWrite<'_>) -> Result<(), BackendError> {
            panic!("driver exploded");
        }
    }

    #[tokio::test]
    async fn panics_become_internal_errors() {
        let service = IngestService::with_backend(Arc::new(Panicking));
        let resp = service.insert_document(IngestRequest::new("{}")).await;

        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.status_message, "Error: Internal server error");
        assert!(resp.details.contains("driver exploded"));
    }

    #[tokio::test]
    async fn validation_failure_allocates_nothing() {
        let service = IngestService::simulated();
        let resp = service.insert_document(IngestRequest::new("{")).await;

        assert_eq!(resp.status_code, 400);
        assert!(resp.uri.is_none());
        assert_eq!(service.allocator().allocated(), 0);
        assert_eq!(service.fallback_store().count(), 0);
    }

    #[tokio::test]
    async fn same_payload_twice_gets_two_uris() {
        let service = IngestService::simulated();
        let first = service.insert_document(IngestRequest::new(r#"{"a":1}"#)).await;
        let second = service.insert_document(IngestRequest::new(r#"{"a":1}"#)).await;

        assert!(first.is_success() && second.is_success());
        assert_ne!(first.uri, second.uri);
        let n1 = parse_allocated(first.uri.as_deref().unwrap()).unwrap().0;
        let n2 = parse_allocated(second.uri.as_deref().unwrap()).unwrap().0;
        assert!(n2 > n1);
        assert_eq!(service.fallback_store().count(), 2);
    }

    #[test]
    fn panic_message_handles_payload_types() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "panic with non-string payload");
    }
}
