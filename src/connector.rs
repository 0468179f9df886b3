//! Startup-time backend selection.
//!
//! [`BackendConnector::connect`] runs once. Whatever it decides is final
//! for the life of the process: there is no background reconnection.
use crate::backend::DocumentBackend;
use crate::config::BackendConfig;
use crate::types::ServiceMode;
use std::sync::Arc;
use thiserror::Error;

/// Why the real backend could not be used.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build client: {0}")]
    Client(String),

    #[error("connectivity check failed: {0}")]
    Unreachable(String),

    #[error("MarkLogic client support not compiled in (enable the `marklogic` feature)")]
    Unavailable,
}

/// Outcome of the startup connection attempt.
#[derive(Clone)]
pub enum Connection {
    /// Live handle to the real store, shared read-only by all requests.
    Connected(Arc<dyn DocumentBackend>),
    Simulated,
}

impl Connection {
    pub fn mode(&self) -> ServiceMode {
        match self {
            Connection::Connected(_) => ServiceMode::Connected,
            Connection::Simulated => ServiceMode::Simulated,
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connection::Connected(backend) => {
                f.debug_tuple("Connected").field(&backend.name()).finish()
            }
            Connection::Simulated => f.write_str("Simulated"),
        }
    }
}

pub struct BackendConnector;

impl BackendConnector {
    /// Try the real store; settle on simulation mode on any failure.
    pub async fn connect(config: &BackendConfig) -> Connection {
        match Self::try_connect(config).await {
            Ok(backend) => {
                tracing::info!(
                    host = %config.host,
                    port = config.port,
                    database = %config.database,
                    "connected to MarkLogic"
                );
                Connection::Connected(backend)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to connect to MarkLogic");
                tracing::warn!("falling back to simulation mode");
                Connection::Simulated
            }
        }
    }

    /// Build the client and run the connectivity check.
    #[cfg(feature = "marklogic")]
    pub async fn try_connect(
        config: &BackendConfig,
    ) -> Result<Arc<dyn DocumentBackend>, ConnectError> {
        use crate::backend::MarkLogicBackend;

        config
            .validate()
            .map_err(|e| ConnectError::Config(e.to_string()))?;
        let backend =
            MarkLogicBackend::new(config).map_err(|e| ConnectError::Client(e.to_string()))?;
        backend
            .ping()
            .await
            .map_err(|e| ConnectError::Unreachable(e.to_string()))?;
        Ok(Arc::new(backend))
    }

    #[cfg(not(feature = "marklogic"))]
    pub async fn try_connect(
        _config: &BackendConfig,
    ) -> Result<Arc<dyn DocumentBackend>, ConnectError> {
        Err(ConnectError::Unavailable)
    }
}
