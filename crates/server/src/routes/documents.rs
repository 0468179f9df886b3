use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use docingest::{IngestRequest, IngestResponse};
use std::sync::Arc;

/// `InsertDocument`: validate, resolve the URI and persist one JSON document.
///
/// The HTTP status mirrors `status_code` and the body is an
/// `IngestResponse`. Only an envelope that is not a JSON object of the
/// expected shape (400) or one over the body limit (413) gets a
/// `ServerError` body instead.
///
/// # Example
/// ```json
/// // Request
/// {
///   "json_data": "{\"title\":\"x\"}",
///   "document_uri": "/customers/1.json",
///   "collections": ["customers"],
///   "metadata": {"source": "crm"}
/// }
///
/// // Response
/// {
///   "status_code": 200,
///   "status_message": "Document inserted successfully (simulation mode)",
///   "document_uri": "/customers/1.json",
///   "details": "Document size: 13 bytes, Collections: 1, Metadata entries: 1, Mode: Simulation"
/// }
/// ```
pub async fn insert_document(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(state.config.max_body_size_mb)
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    })?;
    let response = state.service.insert_document(request).await;
    Ok((http_status(&response), Json(response)))
}

fn http_status(response: &IngestResponse) -> StatusCode {
    StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
