//! Request validation: the only stage allowed to reject a request as a
//! client error. Has no side effects.
use crate::error::IngestError;
use crate::types::IngestRequest;
use serde_json::Value;

/// Check that the request carries a JSON payload and decode it.
///
/// Any JSON value is accepted: objects, arrays and bare primitives.
///
/// ```rust
/// use docingest::{validate, IngestError, IngestRequest};
///
/// let value = validate(&IngestRequest::new("[1, 2, 3]")).unwrap();
/// assert!(value.is_array());
///
/// let err = validate(&IngestRequest::new("")).unwrap_err();
/// assert_eq!(err, IngestError::EmptyPayload);
/// ```
pub fn validate(request: &IngestRequest) -> Result<Value, IngestError> {
    if request.payload.is_empty() {
        return Err(IngestError::EmptyPayload);
    }

    serde_json::from_str(&request.payload).map_err(|e| {
        let err = IngestError::MalformedPayload(e.to_string());
        tracing::error!(error = %err, "rejected malformed payload");
        err
    })
}
