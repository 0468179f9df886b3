//! MarkLogic REST API client.
//!
//! Documents are written with `PUT /v1/documents`, one request per
//! document. Collections travel as repeated `collection` parameters and
//! metadata as `value:<key>` parameters. Reachability is probed with
//! `GET /v1/ping`.
//!
//! Failure classification:
//!
//! | Failure | Classified as |
//! |---------|---------------|
//! | connect error, timeout, request could not be sent | [`BackendError::Connectivity`] |
//! | HTTP 502 / 503 / 504 | [`BackendError::Connectivity`] |
//! | request could not be built or encoded | [`BackendError::Serialization`] |
//! | any other non-2xx status | [`BackendError::Rejected`] |
use super::{DocumentBackend, DocumentWrite};
use crate::config::BackendConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::error::Error as StdError;

/// Longest slice of an error body kept in diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Writes documents to a MarkLogic database over HTTP.
///
/// The inner `reqwest::Client` pools connections and is safe to share
/// between concurrent requests.
#[derive(Debug, Clone)]
pub struct MarkLogicBackend {
    client: Client,
    base_url: String,
    database: String,
    username: String,
    password: String,
}

impl MarkLogicBackend {
    /// Build a client for `config`. Does not touch the network.
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lightweight reachability and credential check.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(format!("{}/v1/ping", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(classify_transport)?;

        ensure_success(response).await
    }

    fn document_query(&self, write: &DocumentWrite<'_>) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(3 + write.collections.len() + write.metadata.len());
        query.push(("uri".to_string(), write.uri.to_string()));
        query.push(("database".to_string(), self.database.clone()));
        query.push(("format".to_string(), "json".to_string()));
        for collection in write.collections {
            query.push(("collection".to_string(), collection.clone()));
        }
        for (key, value) in write.metadata {
            query.push((format!("value:{key}"), value.clone()));
        }
        query
    }
}

#[async_trait]
impl DocumentBackend for MarkLogicBackend {
    fn name(&self) -> &'static str {
        "marklogic"
    }

    async fn insert(&self, write: DocumentWrite<'_>) -> Result<(), BackendError> {
        let body = serde_json::to_vec(write.content)
            .map_err(|e| BackendError::Serialization(e.to_string()))?;

        let response = self
            .client
            .put(format!("{}/v1/documents", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .query(&self.document_query(&write))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify_transport)?;

        ensure_success(response).await?;
        tracing::info!(uri = %write.uri, database = %self.database, "document inserted into MarkLogic");
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status.as_u16(), &body))
}

/// Map a non-2xx status to a write failure.
pub(crate) fn classify_status(status: u16, body: &str) -> BackendError {
    let message: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
    match status {
        502..=504 => BackendError::Connectivity(format!("HTTP {status}: {message}")),
        _ => BackendError::Rejected { status, message },
    }
}

fn classify_transport(err: reqwest::Error) -> BackendError {
    let message = error_chain(&err);
    if err.is_builder() {
        BackendError::Serialization(message)
    } else {
        BackendError::Connectivity(message)
    }
}

// reqwest's top-level message is generic; the cause is in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
