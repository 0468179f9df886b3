//! API route handlers
//!
//! - `documents`: the `InsertDocument` operation
//! - `health`: liveness and readiness probes

pub mod documents;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "docingest server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "operations": ["InsertDocument"],
        "endpoints": [
            "POST /v1/documents",
            "GET /health",
            "GET /ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
