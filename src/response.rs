//! Response construction.
//!
//! Every path through the pipeline ends in exactly one [`Outcome`], and
//! every [`Outcome`] maps to exactly one [`IngestResponse`].
use crate::error::IngestError;
use crate::types::IngestResponse;

/// Classified result of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written to the real backend.
    Stored {
        uri: String,
        collections: usize,
        metadata: usize,
    },
    /// Written to the fallback store, either because the service runs in
    /// simulated mode or because this one write was degraded.
    Simulated {
        uri: String,
        size_bytes: usize,
        collections: usize,
        metadata: usize,
    },
    /// Rejected or failed. `uri` is set once allocation has happened.
    Failed {
        uri: Option<String>,
        error: IngestError,
    },
}

impl Outcome {
    pub fn failed(error: IngestError) -> Self {
        Outcome::Failed { uri: None, error }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Outcome::Stored { uri, .. } | Outcome::Simulated { uri, .. } => Some(uri),
            Outcome::Failed { uri, .. } => uri.as_deref(),
        }
    }
}

impl From<Outcome> for IngestResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Stored {
                uri,
                collections,
                metadata,
            } => IngestResponse {
                status_code: 200,
                status_message: "Document inserted successfully into MarkLogic".into(),
                uri: Some(uri),
                details: format!(
                    "Document inserted with {collections} collections and {metadata} metadata entries"
                ),
            },
            Outcome::Simulated {
                uri,
                size_bytes,
                collections,
                metadata,
            } => IngestResponse {
                status_code: 200,
                status_message: "Document inserted successfully (simulation mode)".into(),
                uri: Some(uri),
                details: format!(
                    "Document size: {size_bytes} bytes, Collections: {collections}, \
                     Metadata entries: {metadata}, Mode: Simulation"
                ),
            },
            Outcome::Failed { uri, error } => IngestResponse {
                status_code: error.status_code(),
                status_message: failure_message(&error).into(),
                uri,
                details: error.to_string(),
            },
        }
    }
}

fn failure_message(error: &IngestError) -> &'static str {
    match error {
        IngestError::EmptyPayload => "Error: JSON data is required",
        IngestError::MalformedPayload(_) => "Error: Invalid JSON format",
        IngestError::BackendConnectivity(_) => "Error: Database connection error",
        IngestError::Internal(_) => "Error: Internal server error",
    }
}
