use crate::config::ServerConfig;
use docingest::IngestService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Ingestion pipeline (shared across requests)
    pub service: Arc<IngestService>,

    started_at: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig, service: IngestService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            mode: self.service.mode().to_string(),
            fallback_documents: self.service.fallback_store().count(),
            allocated_uris: self.service.allocator().allocated(),
        }
    }
}

/// Backend snapshot reported by the readiness probe.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub mode: String,
    pub fallback_documents: usize,
    pub allocated_uris: u64,
}
