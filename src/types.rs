//! Request, response and record types shared by every pipeline stage.
//!
//! Wire names follow the document service message schema (`json_data`,
//! `document_uri`, ...) while the Rust field names describe their role.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Inbound `InsertDocument` request.
///
/// Every field defaults to empty so a partially filled envelope still
/// reaches validation instead of failing at decode time.
///
/// ```rust
/// use docingest::IngestRequest;
///
/// let req = IngestRequest::new(r#"{"title":"x"}"#)
///     .with_uri("/docs/x.json")
///     .with_collections(["drafts"])
///     .with_metadata("source", "crm");
/// assert_eq!(req.uri.as_deref(), Some("/docs/x.json"));
/// assert_eq!(req.collections, vec!["drafts".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Raw text expected to hold a JSON document.
    #[serde(rename = "json_data", default)]
    pub payload: String,

    /// Caller-supplied target URI. Empty is treated the same as absent.
    #[serde(
        rename = "document_uri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,

    /// Collection tags, in caller order.
    #[serde(default)]
    pub collections: Vec<String>,

    /// Free-form key/value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl IngestRequest {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The caller's URI, if one was actually supplied.
    pub fn requested_uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|uri| !uri.is_empty())
    }
}

/// Uniform result of `InsertDocument`, produced on every code path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    /// 200, 400 or 500.
    pub status_code: u16,
    /// Short human-readable summary. Never empty.
    pub status_message: String,
    /// Resolved URI; absent when the request failed before allocation.
    #[serde(
        rename = "document_uri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub uri: Option<String>,
    /// Longer diagnostic text, possibly empty.
    #[serde(default)]
    pub details: String,
}

impl IngestResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// A document held by the in-memory fallback store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub uri: String,
    pub data: Value,
    pub collections: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub inserted_at: DateTime<Utc>,
    /// Byte length of the original `json_data` text.
    pub size_bytes: usize,
}

/// Process-wide backend mode, fixed once the connector has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    Connected,
    Simulated,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMode::Connected => "connected",
            ServiceMode::Simulated => "simulated",
        }
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
