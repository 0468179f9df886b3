//! Backend selection and failure classification for a single write.
use crate::backend::{DocumentBackend, DocumentWrite};
use crate::error::{BackendError, IngestError};
use crate::response::Outcome;
use crate::types::ServiceMode;
use std::sync::Arc;

/// Routes validated documents to the real backend or the fallback store.
///
/// The mode is fixed at construction. A degraded write lands in the
/// fallback store but leaves the router in [`ServiceMode::Connected`].
#[derive(Clone)]
pub struct PersistenceRouter {
    primary: Option<Arc<dyn DocumentBackend>>,
    fallback: Arc<dyn DocumentBackend>,
}

impl PersistenceRouter {
    /// Router that sends every write to `fallback`.
    pub fn simulated(fallback: Arc<dyn DocumentBackend>) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }

    /// Router that writes through `primary` and degrades to `fallback`.
    pub fn connected(primary: Arc<dyn DocumentBackend>, fallback: Arc<dyn DocumentBackend>) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    pub fn mode(&self) -> ServiceMode {
        if self.primary.is_some() {
            ServiceMode::Connected
        } else {
            ServiceMode::Simulated
        }
    }

    pub async fn route(&self, write: DocumentWrite<'_>) -> Outcome {
        let Some(primary) = &self.primary else {
            return self.simulate(write).await;
        };

        match primary.insert(write).await {
            Ok(()) => Outcome::Stored {
                uri: write.uri.to_string(),
                collections: write.collections.len(),
                metadata: write.metadata.len(),
            },
            Err(BackendError::Connectivity(reason)) => {
                tracing::error!(uri = %write.uri, backend = primary.name(), %reason, "backend connection error");
                Outcome::Failed {
                    uri: Some(write.uri.to_string()),
                    error: IngestError::BackendConnectivity(reason),
                }
            }
            Err(err @ (BackendError::Serialization(_) | BackendError::Rejected { .. })) => {
                tracing::warn!(
                    uri = %write.uri,
                    backend = primary.name(),
                    error = %err,
                    "backend insertion failed, falling back to simulation"
                );
                self.simulate(write).await
            }
        }
    }

    async fn simulate(&self, write: DocumentWrite<'_>) -> Outcome {
        let simulated = Outcome::Simulated {
            uri: write.uri.to_string(),
            size_bytes: write.size_bytes,
            collections: write.collections.len(),
            metadata: write.metadata.len(),
        };

        match self.fallback.insert(write).await {
            Ok(()) => simulated,
            // The in-memory store never fails; a custom fallback might.
            Err(err) => Outcome::Failed {
                uri: Some(write.uri.to_string()),
                error: IngestError::Internal(format!("fallback store write failed: {err}")),
            },
        }
    }
}

impl std::fmt::Debug for PersistenceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceRouter")
            .field("mode", &self.mode())
            .field("primary", &self.primary.as_ref().map(|b| b.name()))
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
