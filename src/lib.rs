//! JSON document ingestion with a degradable persistence path.
//!
//! A request carries a JSON payload, an optional target URI, collection
//! tags and metadata. The pipeline:
//!
//! 1. **Validate** ([`validate`]): reject empty or unparseable payloads (400).
//! 2. **Allocate** ([`IdAllocator`]): keep the caller's URI or mint
//!    `/documents/doc_{n}_{hex8}.json`.
//! 3. **Route** ([`PersistenceRouter`]): write through the real store when
//!    the service started [`ServiceMode::Connected`], otherwise into the
//!    in-memory [`FallbackStore`]. A write the real store refuses is
//!    degraded to the fallback store; an unreachable store is reported (500).
//! 4. **Respond** ([`IngestResponse`]): one uniformly shaped answer per call.
//!
//! [`IngestService`] ties the stages together and is the type an RPC or
//! HTTP layer holds on to. The backend decision is made once, at startup,
//! by [`BackendConnector`].
//!
//! ```rust
//! use docingest::{IngestRequest, IngestService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let service = IngestService::simulated();
//!
//! let resp = service
//!     .insert_document(
//!         IngestRequest::new(r#"{"a":1}"#)
//!             .with_uri("/customers/1.json")
//!             .with_collections(["c1", "c2"]),
//!     )
//!     .await;
//!
//! assert_eq!(resp.status_code, 200);
//! assert_eq!(resp.uri.as_deref(), Some("/customers/1.json"));
//! # }
//! ```

pub mod allocator;
pub mod backend;
pub mod config;
pub mod connector;
pub mod error;
pub mod response;
pub mod router;
pub mod service;
pub mod types;
pub mod validate;

pub use allocator::{IdAllocator, parse_allocated};
#[cfg(feature = "marklogic")]
pub use backend::MarkLogicBackend;
pub use backend::{DocumentBackend, DocumentWrite, FallbackStore};
pub use config::{BackendConfig, ConfigError};
pub use connector::{BackendConnector, ConnectError, Connection};
pub use error::{BackendError, IngestError};
pub use response::Outcome;
pub use router::PersistenceRouter;
pub use service::IngestService;
pub use types::{IngestRequest, IngestResponse, ServiceMode, StoredRecord};
pub use validate::validate;
