//! Error types produced by the ingestion pipeline.
//!
//! Two layers of errors exist:
//!
//! | Error | Raised by | Surfaces as |
//! |-------|-----------|-------------|
//! | [`IngestError`] | validation, routing, service boundary | `status_code` 400 or 500 |
//! | [`BackendError`] | a single [`DocumentBackend`](crate::DocumentBackend) write | classified by the router |
//!
//! A [`BackendError`] never reaches the caller directly. The router turns
//! [`BackendError::Connectivity`] into [`IngestError::BackendConnectivity`]
//! and degrades every other variant to the fallback store.
//!
//! ```rust
//! use docingest::IngestError;
//!
//! let err = IngestError::MalformedPayload("EOF while parsing an object".into());
//! assert_eq!(err.status_code(), 400);
//! assert!(err.to_string().contains("Invalid JSON format"));
//! ```
use thiserror::Error;

/// Failures that end a request with a non-200 response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The `json_data` field was missing or empty.
    #[error("The json_data payload is required and cannot be empty")]
    EmptyPayload,

    /// The payload is not valid JSON. Carries the parser diagnostic.
    #[error("Invalid JSON format: {0}")]
    MalformedPayload(String),

    /// The real backend could not be reached while writing.
    #[error("Backend connection error: {0}")]
    BackendConnectivity(String),

    /// Anything the pipeline did not anticipate, including panics.
    #[error("Unexpected error during document insertion: {0}")]
    Internal(String),
}

impl IngestError {
    /// Returns true for errors caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::EmptyPayload | IngestError::MalformedPayload(_)
        )
    }

    /// Status code carried in the response for this error.
    ///
    /// ```rust
    /// use docingest::IngestError;
    ///
    /// assert_eq!(IngestError::EmptyPayload.status_code(), 400);
    /// assert_eq!(IngestError::Internal("boom".into()).status_code(), 500);
    /// ```
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}

/// Classified failure of a single backend write.
///
/// The set of variants is fixed so the router's decision is a plain match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No usable response from the store: connect failure, timeout, or a
    /// gateway/unavailable status.
    #[error("connection error: {0}")]
    Connectivity(String),

    /// The document could not be encoded for the wire.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store answered but refused the write.
    #[error("write rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl BackendError {
    /// Whether the failure means the backend is unreachable rather than
    /// unwilling.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Connectivity(_))
    }
}
