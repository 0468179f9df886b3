//! Document persistence backends.
//!
//! The router only ever talks to [`DocumentBackend`]; which implementation
//! sits behind it is decided once by the
//! [`BackendConnector`](crate::BackendConnector):
//!
//! - [`MarkLogicBackend`] (feature `marklogic`) writes through the
//!   MarkLogic REST API.
//! - [`FallbackStore`] keeps documents in process memory and never fails.

#[cfg(feature = "marklogic")]
pub mod marklogic;
pub mod memory;

#[cfg(feature = "marklogic")]
pub use marklogic::MarkLogicBackend;
pub use memory::FallbackStore;

use crate::error::BackendError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// One validated document on its way to a backend.
#[derive(Debug, Clone, Copy)]
pub struct DocumentWrite<'a> {
    pub uri: &'a str,
    pub content: &'a Value,
    pub collections: &'a [String],
    pub metadata: &'a HashMap<String, String>,
    /// Byte length of the caller's original payload text.
    pub size_bytes: usize,
}

/// Insert capability shared by the real and simulated stores.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Insert or overwrite the document at `write.uri`.
    async fn insert(&self, write: DocumentWrite<'_>) -> Result<(), BackendError>;
}
